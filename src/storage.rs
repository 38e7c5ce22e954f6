#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::clock::DayStamp;
use crate::timeslots::{SlotError, SlotMeta, Timeslots};

pub const DEFAULT_STORAGE_KEY: &str = "timeslots";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8: {source}")]
    NotUtf8 {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[error("failed to encode day data: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CreateSlotError {
    #[error(transparent)]
    Rejected(#[from] SlotError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Reasons a persisted blob is thrown away in favour of a fresh day.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadAnomaly {
    #[error("persisted day data is malformed: {0}")]
    MalformedPersistedData(String),
    #[error("persisted day data belongs to {0}")]
    StaleDate(DayStamp),
}

/// Single-key string storage. Each `set` replaces the previous value whole.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key under a directory. Writes land in a
/// temporary sibling first and are renamed over the target.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|source| StorageError::NotUtf8 { path, source })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StorageError::Io { path, source }
        };

        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        let path = self.path_for(key);
        let staging = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&staging, value).map_err(io_error(&staging))?;
        fs::rename(&staging, &path).map_err(io_error(&path))?;
        Ok(())
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Everything persisted for one calendar day. Unknown top-level fields of
/// the stored record ride along in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayStore {
    pub date: DayStamp,
    pub timeslots: Timeslots,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DayStore {
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            date: DayStamp::of(today),
            timeslots: Timeslots::new(),
            extra: Map::new(),
        }
    }

    pub fn is_for(&self, today: NaiveDate) -> bool {
        self.date == DayStamp::of(today)
    }
}

/// Decodes a stored record for `today`. A missing or unreadable `timeslots`
/// field falls back to an empty day rather than failing the record.
pub fn decode_day(raw: &str, today: NaiveDate) -> Result<DayStore, LoadAnomaly> {
    let mut record = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(record)) => record,
        Ok(other) => {
            return Err(LoadAnomaly::MalformedPersistedData(format!(
                "expected an object, found {other}"
            )));
        }
        Err(err) => return Err(LoadAnomaly::MalformedPersistedData(err.to_string())),
    };

    let date = record
        .remove("date")
        .ok_or_else(|| LoadAnomaly::MalformedPersistedData("missing date".to_string()))?;
    let date: DayStamp = serde_json::from_value(date)
        .map_err(|err| LoadAnomaly::MalformedPersistedData(format!("bad date: {err}")))?;
    if date != DayStamp::of(today) {
        return Err(LoadAnomaly::StaleDate(date));
    }

    let timeslots = match record.remove("timeslots") {
        Some(value) => serde_json::from_value(value).unwrap_or_else(|err| {
            warn!("discarding unreadable timeslots: {err}");
            Timeslots::new()
        }),
        None => Timeslots::new(),
    };

    Ok(DayStore {
        date: DayStamp::of(today),
        timeslots,
        extra: record,
    })
}

/// Day-scoped access to the persisted timeslots under a single key.
#[derive(Debug, Clone)]
pub struct DayRepository<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> DayRepository<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Today's store, or a fresh empty one when nothing usable for today is
    /// persisted.
    pub fn load_for_today(&self, today: NaiveDate) -> Result<DayStore, StorageError> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no persisted day under {}, starting fresh", self.key);
                return Ok(DayStore::fresh(today));
            }
            Err(err @ StorageError::NotUtf8 { .. }) => {
                let anomaly = LoadAnomaly::MalformedPersistedData(err.to_string());
                warn!("{anomaly}, starting a fresh day");
                return Ok(DayStore::fresh(today));
            }
            Err(err) => return Err(err),
        };

        match decode_day(&raw, today) {
            Ok(day) => Ok(day),
            Err(anomaly @ LoadAnomaly::StaleDate(_)) => {
                info!("{anomaly}, starting a fresh day");
                Ok(DayStore::fresh(today))
            }
            Err(anomaly) => {
                warn!("{anomaly}, starting a fresh day");
                Ok(DayStore::fresh(today))
            }
        }
    }

    pub fn save(&mut self, day: &DayStore) -> Result<(), StorageError> {
        let blob = serde_json::to_string(day)?;
        self.store.set(&self.key, &blob)?;
        debug!("saved {} timeslots under {}", day.timeslots.len(), self.key);
        Ok(())
    }

    pub fn reset(&mut self, today: NaiveDate) -> Result<DayStore, StorageError> {
        let day = DayStore::fresh(today);
        self.save(&day)?;
        info!("reset timeslots for {today}");
        Ok(day)
    }

    /// Re-reads today's store, adds the slot and writes the result back.
    /// A blank name abandons the request with `Ok(None)`.
    pub fn create_slot(
        &mut self,
        today: NaiveDate,
        name: &str,
        start: i64,
        end: i64,
    ) -> Result<Option<DayStore>, CreateSlotError> {
        let name = name.trim();
        if name.is_empty() {
            debug!("blank timeslot name, nothing to create");
            return Ok(None);
        }

        self.insert_slot(today, SlotMeta::named(name)?, start, end)
            .map(Some)
    }

    pub fn insert_slot(
        &mut self,
        today: NaiveDate,
        meta: SlotMeta,
        start: i64,
        end: i64,
    ) -> Result<DayStore, CreateSlotError> {
        let day = self.load_for_today(today)?;
        let timeslots = day.timeslots.insert(start, end, meta)?;
        let day = DayStore { timeslots, ..day };
        self.save(&day)?;
        Ok(day)
    }
}
