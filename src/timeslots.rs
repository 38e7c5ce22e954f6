use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::clock::LAST_SECOND;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("timeslot metadata needs a non-empty string `name`")]
    InvalidMeta,
    #[error("{start}-{end} overlaps an existing timeslot")]
    Overlap { start: u32, end: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotMeta {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SlotMeta {
    pub fn named(name: impl Into<String>) -> Result<Self, SlotError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SlotError::InvalidMeta);
        }

        Ok(Self {
            name,
            extra: Map::new(),
        })
    }

    /// Accepts free-form metadata as long as it carries a string `name`.
    pub fn from_value(value: Value) -> Result<Self, SlotError> {
        let Value::Object(mut fields) = value else {
            return Err(SlotError::InvalidMeta);
        };

        let name = match fields.remove("name") {
            Some(Value::String(name)) if !name.is_empty() => name,
            _ => return Err(SlotError::InvalidMeta),
        };

        Ok(Self {
            name,
            extra: fields,
        })
    }
}

/// Named, inclusive second range inside one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: u32,
    pub end: u32,
    pub meta: SlotMeta,
}

impl TimeRange {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn contains(&self, seconds: u32) -> bool {
        self.start <= seconds && seconds <= self.end
    }

    fn touches(&self, next: &TimeRange) -> bool {
        self.end + 1 == next.start && self.meta.name == next.meta.name
    }
}

/// Swaps a reversed range and clamps both ends into the day.
pub fn normalize(start: i64, end: i64) -> (u32, u32) {
    let (low, high) = if start <= end { (start, end) } else { (end, start) };
    let clamp = |value: i64| value.clamp(0, i64::from(LAST_SECOND)) as u32;
    (clamp(low), clamp(high))
}

/// Today's timeslots, sorted by `start` and pairwise disjoint. `insert` and
/// `try_from` are the only ways to build a non-empty value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TimeRange>", into = "Vec<TimeRange>")]
pub struct Timeslots {
    slots: Vec<TimeRange>,
}

impl Timeslots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[TimeRange] {
        &self.slots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeRange> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns a new sequence with `[start, end]` added, merging it into a
    /// touching neighbour of the same name. `self` is left as it was.
    pub fn insert(&self, start: i64, end: i64, meta: SlotMeta) -> Result<Timeslots, SlotError> {
        if meta.name.is_empty() {
            return Err(SlotError::InvalidMeta);
        }

        let (start, end) = normalize(start, end);
        let index = self.slots.partition_point(|slot| slot.start <= start);

        let previous = index.checked_sub(1).and_then(|at| self.slots.get(at));
        let next = self.slots.get(index);
        let overlaps_previous = previous.is_some_and(|slot| slot.end >= start);
        let overlaps_next = next.is_some_and(|slot| slot.start <= end);
        if overlaps_previous || overlaps_next {
            return Err(SlotError::Overlap { start, end });
        }

        let mut slots = self.slots.clone();
        slots.insert(index, TimeRange { start, end, meta });

        let mut current = index;
        if current > 0 && slots[current - 1].touches(&slots[current]) {
            let merged = slots.remove(current);
            current -= 1;
            slots[current].end = merged.end;
        }
        if current + 1 < slots.len() && slots[current].touches(&slots[current + 1]) {
            let merged = slots.remove(current + 1);
            slots[current].end = merged.end;
        }

        let inserted = Timeslots { slots };
        debug_assert!(inserted.check_invariant().is_ok());
        Ok(inserted)
    }

    pub fn find_active(&self, now_seconds: u32) -> Option<&TimeRange> {
        find_active_slot(&self.slots, now_seconds)
    }

    fn check_invariant(&self) -> Result<(), String> {
        for slot in &self.slots {
            if slot.meta.name.is_empty() {
                return Err("timeslot without a name".to_string());
            }
            if slot.start > slot.end || slot.end > LAST_SECOND {
                return Err(format!("timeslot out of range: {}-{}", slot.start, slot.end));
            }
        }

        for pair in self.slots.windows(2) {
            if pair[0].end >= pair[1].start {
                return Err(format!(
                    "timeslots out of order or overlapping: {}-{} and {}-{}",
                    pair[0].start, pair[0].end, pair[1].start, pair[1].end
                ));
            }
        }

        Ok(())
    }
}

impl TryFrom<Vec<TimeRange>> for Timeslots {
    type Error = String;

    fn try_from(slots: Vec<TimeRange>) -> Result<Self, Self::Error> {
        let timeslots = Timeslots { slots };
        timeslots.check_invariant()?;
        Ok(timeslots)
    }
}

impl From<Timeslots> for Vec<TimeRange> {
    fn from(timeslots: Timeslots) -> Self {
        timeslots.slots
    }
}

pub fn find_active_slot(slots: &[TimeRange], now_seconds: u32) -> Option<&TimeRange> {
    slots.iter().find(|slot| slot.contains(now_seconds))
}
