use std::fmt::{Display, Formatter};

const HASH_SEED: i32 = 5381;

/// Where a slot sits relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Upcoming,
    Past,
    Running,
}

impl SlotState {
    pub fn label(self) -> &'static str {
        match self {
            SlotState::Upcoming => "upcoming",
            SlotState::Past => "past",
            SlotState::Running => "running",
        }
    }

    // (saturation %, lightness %, alpha)
    fn tone(self) -> (u8, u8, f32) {
        match self {
            SlotState::Running => (5, 30, 0.8),
            SlotState::Past => (15, 25, 0.35),
            SlotState::Upcoming => (70, 55, 0.7),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsla {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
    pub alpha: f32,
}

impl Hsla {
    pub fn to_rgb(self) -> (u8, u8, u8) {
        let s = f32::from(self.saturation) / 100.0;
        let l = f32::from(self.lightness) / 100.0;
        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let sector = f32::from(self.hue) / 60.0;
        let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
        let (r, g, b) = match self.hue / 60 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        let channel = |value: f32| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }

    /// Flattens the alpha channel against an opaque background.
    pub fn over(self, background: (u8, u8, u8)) -> (u8, u8, u8) {
        let (r, g, b) = self.to_rgb();
        let blend = |front: u8, back: u8| {
            (f32::from(front) * self.alpha + f32::from(back) * (1.0 - self.alpha))
                .round()
                .clamp(0.0, 255.0) as u8
        };
        (blend(r, background.0), blend(g, background.1), blend(b, background.2))
    }
}

impl Display for Hsla {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hsla({}, {}%, {}%, {})",
            self.hue, self.saturation, self.lightness, self.alpha
        )
    }
}

/// DJB2 over UTF-16 code units in wrapping 32-bit signed arithmetic.
pub fn name_hash(name: &str) -> i32 {
    name.encode_utf16().fold(HASH_SEED, |hash, code| {
        (hash.wrapping_shl(5)).wrapping_add(hash) ^ i32::from(code)
    })
}

pub fn hue_for(name: &str) -> u16 {
    (i64::from(name_hash(name)).abs() % 360) as u16
}

pub fn color_for(name: &str, is_past: bool, is_running: bool) -> Hsla {
    let state = if is_running {
        SlotState::Running
    } else if is_past {
        SlotState::Past
    } else {
        SlotState::Upcoming
    };
    color_for_state(name, state)
}

pub fn color_for_state(name: &str, state: SlotState) -> Hsla {
    let (saturation, lightness, alpha) = state.tone();
    Hsla {
        hue: hue_for(name),
        saturation,
        lightness,
        alpha,
    }
}

#[cfg(test)]
mod tests {
    use super::{Hsla, color_for, hue_for, name_hash};

    #[test]
    fn hashes_like_djb2_xor() {
        assert_eq!(name_hash(""), 5381);
        assert_eq!(name_hash("a"), (5381 * 33) ^ 97);
        assert_eq!(name_hash("ab"), (((5381 * 33) ^ 97) * 33) ^ 98);
    }

    #[test]
    fn long_names_wrap_instead_of_overflowing() {
        let name = "a very long timeslot name that certainly overflows thirty two bits";
        let hue = hue_for(name);
        assert!(hue < 360);
        assert_eq!(hue, hue_for(name));
    }

    #[test]
    fn hue_is_stable_across_states() {
        for name in ["focus", "lunch", "deep work", "réunion", ""] {
            let upcoming = color_for(name, false, false);
            let past = color_for(name, true, false);
            let running = color_for(name, false, true);
            let running_past = color_for(name, true, true);
            assert_eq!(upcoming.hue, past.hue);
            assert_eq!(upcoming.hue, running.hue);
            assert_eq!(running, running_past);
        }
    }

    #[test]
    fn state_selects_tone() {
        let running = color_for("focus", false, true);
        assert_eq!((running.saturation, running.lightness, running.alpha), (5, 30, 0.8));
        let past = color_for("focus", true, false);
        assert_eq!((past.saturation, past.lightness, past.alpha), (15, 25, 0.35));
        let upcoming = color_for("focus", false, false);
        assert_eq!((upcoming.saturation, upcoming.lightness, upcoming.alpha), (70, 55, 0.7));
    }

    #[test]
    fn renders_css_and_rgb() {
        let color = Hsla {
            hue: 0,
            saturation: 100,
            lightness: 50,
            alpha: 0.5,
        };
        assert_eq!(color.to_string(), "hsla(0, 100%, 50%, 0.5)");
        assert_eq!(color.to_rgb(), (255, 0, 0));
        assert_eq!(color.over((0, 0, 0)), (128, 0, 0));
    }
}
