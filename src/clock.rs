use std::fmt::{Display, Formatter};

use chrono::{DateTime, Datelike, Local, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

pub const SECONDS_PER_DAY: u32 = 86_400;
pub const LAST_SECOND: u32 = SECONDS_PER_DAY - 1;

/// Source of "now" for everything that renders or stamps the day.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Portion of the day the bar renders. The dashboard either shows the whole
/// day or starts at 06:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Viewport {
    #[default]
    Midnight,
    Morning,
}

impl Viewport {
    pub fn from_hours(hours: u32) -> Option<Self> {
        match hours {
            0 => Some(Viewport::Midnight),
            6 => Some(Viewport::Morning),
            _ => None,
        }
    }

    pub fn start_hours(self) -> u32 {
        match self {
            Viewport::Midnight => 0,
            Viewport::Morning => 6,
        }
    }

    pub fn start_seconds(self) -> u32 {
        self.start_hours() * 3600
    }

    pub fn toggled(self) -> Self {
        match self {
            Viewport::Midnight => Viewport::Morning,
            Viewport::Morning => Viewport::Midnight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HmsParts {
    pub hh: String,
    pub mm: String,
    pub ss: String,
}

pub fn seconds_since_midnight<T: Timelike>(instant: &T) -> u32 {
    (instant.hour() * 3600 + instant.minute() * 60 + instant.second()).min(LAST_SECOND)
}

pub fn day_progress_percent<T: Timelike>(instant: &T) -> f64 {
    let progress = seconds_since_midnight(instant) as f64 / SECONDS_PER_DAY as f64 * 100.0;
    progress.clamp(0.0, 100.0)
}

pub fn day_remaining_percent<T: Timelike>(instant: &T) -> f64 {
    100.0 - day_progress_percent(instant)
}

pub fn remaining_seconds<T: Timelike>(instant: &T) -> u32 {
    SECONDS_PER_DAY.saturating_sub(seconds_since_midnight(instant))
}

pub fn hms_parts(total_seconds: u32) -> HmsParts {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    HmsParts {
        hh: format!("{hours:02}"),
        mm: format!("{minutes:02}"),
        ss: format!("{seconds:02}"),
    }
}

pub fn format_hms(total_seconds: u32) -> String {
    let parts = hms_parts(total_seconds);
    format!("{}:{}:{}", parts.hh, parts.mm, parts.ss)
}

pub fn to_hhmm(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{hours:02}:{minutes:02}")
}

/// Parses `HH:MM` into seconds since midnight. Anything that is not exactly
/// two digits, a colon and two digits reads as 0.
pub fn from_hhmm(text: &str) -> u32 {
    let bytes = text.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return 0;
    }

    let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
    if !digits.iter().all(u8::is_ascii_digit) {
        return 0;
    }

    let value = |high: u8, low: u8| u32::from(high - b'0') * 10 + u32::from(low - b'0');
    value(digits[0], digits[1]) * 3600 + value(digits[2], digits[3]) * 60
}

/// Turns two minute-resolution picks into a stored range. Reversed picks are
/// swapped first, then the later pick is widened to cover its whole minute.
pub fn minute_span(first: u32, second: u32) -> (u32, u32) {
    let (low, high) = (first.min(second), first.max(second));
    (low.min(LAST_SECOND), high.saturating_add(59).min(LAST_SECOND))
}

pub fn viewport_progress_percent(now_seconds: u32, viewport: Viewport) -> f64 {
    let start = viewport.start_seconds() as f64;
    let span = SECONDS_PER_DAY as f64 - start;
    ((now_seconds as f64 - start) / span * 100.0).clamp(0.0, 100.0)
}

/// Position of `seconds` across the viewport, 0.0 at its left edge and 1.0 at
/// midnight.
pub fn viewport_fraction(seconds: u32, viewport: Viewport) -> f64 {
    viewport_progress_percent(seconds, viewport) / 100.0
}

/// Calendar key a stored day is compared against, persisted as
/// `[day, month, year]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, u32, i32)", into = "(u32, u32, i32)")]
pub struct DayStamp {
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

impl DayStamp {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            day: date.day(),
            month: date.month(),
            year: date.year(),
        }
    }
}

impl Display for DayStamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl From<(u32, u32, i32)> for DayStamp {
    fn from((day, month, year): (u32, u32, i32)) -> Self {
        Self { day, month, year }
    }
}

impl From<DayStamp> for (u32, u32, i32) {
    fn from(stamp: DayStamp) -> Self {
        (stamp.day, stamp.month, stamp.year)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, NaiveTime, TimeZone};

    use super::{
        Clock, DayStamp, FixedClock, Viewport, day_progress_percent, day_remaining_percent, format_hms, from_hhmm,
        hms_parts, minute_span, remaining_seconds, seconds_since_midnight, to_hhmm, viewport_fraction,
        viewport_progress_percent,
    };

    fn at(hour: u32, minute: u32, second: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, second).unwrap()
    }

    #[test]
    fn counts_seconds_since_midnight() {
        assert_eq!(seconds_since_midnight(&at(0, 0, 0)), 0);
        assert_eq!(seconds_since_midnight(&at(1, 2, 3)), 3723);
        assert_eq!(seconds_since_midnight(&at(23, 59, 59)), 86_399);
    }

    #[test]
    fn computes_day_progress_and_remaining() {
        let noon = at(12, 0, 0);
        assert_eq!(day_progress_percent(&noon), 50.0);
        assert_eq!(day_remaining_percent(&noon), 50.0);
        assert_eq!(remaining_seconds(&noon), 43_200);
        assert_eq!(remaining_seconds(&at(0, 0, 0)), 86_400);
        assert_eq!(remaining_seconds(&at(23, 59, 59)), 1);
    }

    #[test]
    fn formats_hms_without_rounding() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(3723), "01:02:03");
        assert_eq!(format_hms(86_399), "23:59:59");

        let parts = hms_parts(45_296);
        assert_eq!((parts.hh.as_str(), parts.mm.as_str(), parts.ss.as_str()), ("12", "34", "56"));
    }

    #[test]
    fn converts_hhmm_both_ways() {
        assert_eq!(to_hhmm(0), "00:00");
        assert_eq!(to_hhmm(3659), "01:00");
        assert_eq!(to_hhmm(86_399), "23:59");
        assert_eq!(from_hhmm("09:30"), 34_200);
        assert_eq!(from_hhmm(&to_hhmm(50_400)), 50_400);
    }

    #[test]
    fn malformed_hhmm_reads_as_midnight() {
        assert_eq!(from_hhmm(""), 0);
        assert_eq!(from_hhmm("9:30"), 0);
        assert_eq!(from_hhmm("09-30"), 0);
        assert_eq!(from_hhmm("09:3a"), 0);
        assert_eq!(from_hhmm(" 09:30"), 0);
    }

    #[test]
    fn minute_span_swaps_before_widening_the_end() {
        assert_eq!(minute_span(32_400, 35_940), (32_400, 35_999));
        assert_eq!(minute_span(36_000, 32_400), (32_400, 36_059));
        assert_eq!(minute_span(from_hhmm("23:59"), 0), (0, 86_399));
        assert_eq!(minute_span(from_hhmm("99:99"), from_hhmm("99:99")), (86_399, 86_399));
    }

    #[test]
    fn viewport_progress_is_clamped_to_the_visible_span() {
        assert_eq!(viewport_progress_percent(43_200, Viewport::Midnight), 50.0);
        assert_eq!(viewport_progress_percent(3600, Viewport::Morning), 0.0);
        assert_eq!(viewport_progress_percent(21_600, Viewport::Morning), 0.0);
        assert_eq!(viewport_progress_percent(54_000, Viewport::Morning), 50.0);
        assert_eq!(viewport_fraction(86_400, Viewport::Morning), 1.0);
    }

    #[test]
    fn viewport_only_accepts_supported_offsets() {
        assert_eq!(Viewport::from_hours(0), Some(Viewport::Midnight));
        assert_eq!(Viewport::from_hours(6), Some(Viewport::Morning));
        assert_eq!(Viewport::from_hours(7), None);
        assert_eq!(Viewport::Morning.toggled(), Viewport::Midnight);
    }

    #[test]
    fn day_stamp_serializes_as_day_month_year() {
        let stamp = DayStamp::of(NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        let json = serde_json::to_string(&stamp).unwrap();
        assert_eq!(json, "[9,3,2026]");
        let parsed: DayStamp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, stamp);
    }

    #[test]
    fn fixed_clock_reports_its_day() {
        let instant = Local.with_ymd_and_hms(2026, 10, 19, 23, 59, 59).unwrap();
        let clock = FixedClock(instant);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert_eq!(seconds_since_midnight(&clock.now()), 86_399);
    }
}
