use chrono::Timelike;

use crate::clock::{
    Viewport, day_progress_percent, day_remaining_percent, format_hms, remaining_seconds,
    seconds_since_midnight, viewport_fraction, viewport_progress_percent,
};
use crate::color::{Hsla, SlotState, color_for, color_for_state};
use crate::timeslots::{TimeRange, Timeslots};

#[derive(Debug, Clone, PartialEq)]
pub struct SlotBand {
    pub start: u32,
    pub end: u32,
    pub name: String,
    pub state: SlotState,
    pub color: Hsla,
    /// Left edge across the viewport, 0.0..=1.0.
    pub left: f64,
    /// Right edge (exclusive) across the viewport, 0.0..=1.0.
    pub right: f64,
}

impl SlotBand {
    pub fn is_visible(&self) -> bool {
        self.right > self.left
    }
}

/// Window chrome that follows the active slot: the terminal title and the
/// accent color standing in for a favicon.
#[derive(Debug, Clone, PartialEq)]
pub struct Chrome {
    pub title: String,
    pub icon: Option<Hsla>,
}

/// Everything a renderer needs for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct DayView {
    pub viewport: Viewport,
    pub now_seconds: u32,
    pub clock: String,
    pub remaining_seconds: u32,
    pub remaining: String,
    pub day_progress: f64,
    pub day_remaining: f64,
    pub viewport_progress: f64,
    pub active: Option<TimeRange>,
    pub active_remaining: Option<u32>,
    pub bands: Vec<SlotBand>,
    pub chrome: Chrome,
}

pub fn slot_state(slot: &TimeRange, now_seconds: u32) -> SlotState {
    if slot.contains(now_seconds) {
        SlotState::Running
    } else if slot.end < now_seconds {
        SlotState::Past
    } else {
        SlotState::Upcoming
    }
}

pub fn derive_view<T: Timelike>(timeslots: &Timeslots, instant: &T, viewport: Viewport) -> DayView {
    let now_seconds = seconds_since_midnight(instant);
    let remaining = remaining_seconds(instant);
    let active = timeslots.find_active(now_seconds).cloned();
    let active_remaining = active.as_ref().map(|slot| slot.end - now_seconds + 1);

    let bands = timeslots
        .iter()
        .map(|slot| {
            let state = slot_state(slot, now_seconds);
            SlotBand {
                start: slot.start,
                end: slot.end,
                name: slot.name().to_string(),
                state,
                color: color_for(
                    slot.name(),
                    state == SlotState::Past,
                    state == SlotState::Running,
                ),
                left: viewport_fraction(slot.start, viewport),
                right: viewport_fraction(slot.end + 1, viewport),
            }
        })
        .collect();

    let chrome = match (&active, active_remaining) {
        (Some(slot), Some(left)) => Chrome {
            title: format!("{} · {}", slot.name(), format_hms(left)),
            icon: Some(color_for_state(slot.name(), SlotState::Running)),
        },
        _ => Chrome {
            title: format!("{} left today", format_hms(remaining)),
            icon: None,
        },
    };

    DayView {
        viewport,
        now_seconds,
        clock: format_hms(now_seconds),
        remaining_seconds: remaining,
        remaining: format_hms(remaining),
        day_progress: day_progress_percent(instant),
        day_remaining: day_remaining_percent(instant),
        viewport_progress: viewport_progress_percent(now_seconds, viewport),
        active,
        active_remaining,
        bands,
        chrome,
    }
}

type Subscriber = Box<dyn FnMut(&Chrome)>;

/// Fans chrome changes out to subscribers. Repeated ticks with the same
/// title and icon notify nobody.
#[derive(Default)]
pub struct ViewPublisher {
    subscribers: Vec<Subscriber>,
    last: Option<Chrome>,
}

impl ViewPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&Chrome) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn publish(&mut self, view: &DayView) -> bool {
        if self.last.as_ref() == Some(&view.chrome) {
            return false;
        }

        for subscriber in &mut self.subscribers {
            subscriber(&view.chrome);
        }
        self.last = Some(view.chrome.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use chrono::NaiveTime;

    use super::{ViewPublisher, derive_view};
    use crate::clock::Viewport;
    use crate::color::SlotState;
    use crate::timeslots::{SlotMeta, Timeslots};

    fn at(hour: u32, minute: u32, second: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, second).unwrap()
    }

    fn day_plan() -> Timeslots {
        Timeslots::new()
            .insert(3600, 7199, SlotMeta::named("early").unwrap())
            .and_then(|slots| slots.insert(32_400, 35_999, SlotMeta::named("focus").unwrap()))
            .and_then(|slots| slots.insert(43_200, 46_799, SlotMeta::named("lunch").unwrap()))
            .unwrap()
    }

    #[test]
    fn derives_clock_and_active_slot() {
        let view = derive_view(&day_plan(), &at(9, 30, 0), Viewport::Midnight);
        assert_eq!(view.clock, "09:30:00");
        assert_eq!(view.remaining, "14:30:00");
        assert_eq!(view.active.as_ref().map(|slot| slot.name()), Some("focus"));
        assert_eq!(view.active_remaining, Some(1800));
        assert_eq!(view.chrome.title, "focus · 00:30:00");
        assert!(view.chrome.icon.is_some());

        let states = view.bands.iter().map(|band| band.state).collect::<Vec<_>>();
        assert_eq!(states, vec![SlotState::Past, SlotState::Running, SlotState::Upcoming]);
    }

    #[test]
    fn idle_title_counts_down_the_day() {
        let view = derive_view(&day_plan(), &at(20, 0, 0), Viewport::Midnight);
        assert!(view.active.is_none());
        assert_eq!(view.chrome.title, "04:00:00 left today");
        assert_eq!(view.chrome.icon, None);
    }

    #[test]
    fn bands_before_the_viewport_are_hidden() {
        let view = derive_view(&day_plan(), &at(9, 0, 0), Viewport::Morning);
        assert!(!view.bands[0].is_visible());
        assert!(view.bands[1].is_visible());
        assert!((view.bands[2].left - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn publishes_only_when_chrome_changes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut publisher = ViewPublisher::new();
        let sink = Rc::clone(&seen);
        publisher.subscribe(move |chrome| sink.borrow_mut().push(chrome.title.clone()));

        let plan = day_plan();
        assert!(publisher.publish(&derive_view(&plan, &at(20, 0, 0), Viewport::Midnight)));
        assert!(!publisher.publish(&derive_view(&plan, &at(20, 0, 0), Viewport::Midnight)));
        assert!(publisher.publish(&derive_view(&plan, &at(20, 0, 1), Viewport::Midnight)));
        assert_eq!(
            *seen.borrow(),
            vec!["04:00:00 left today".to_string(), "03:59:59 left today".to_string()]
        );
    }
}
