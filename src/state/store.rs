use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::rc::Rc;

use chrono::{DateTime, NaiveDate};
use thiserror::Error;
use tracing::{debug, warn};

use crate::alarm::{AlarmMinute, AlarmTime};
use crate::notify::NotificationCooldown;
use crate::state::record::{Record, parse_record_text, render_record_text};

pub const RECORD_KEY: &str = "showerData";
pub const LAST_NOTIFIED_KEY: &str = "lastNotified";
pub const LAST_ALARM_MINUTE_KEY: &str = "lastAlarmMinute";
pub const LAST_ALARM_DATE_KEY: &str = "lastAlarmDate";

const ALARM_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage is unavailable")]
    Unavailable,
}

/// String key-value persistence, the shape of a browser's local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Keeps all keys in a single JSON object file.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(StoreError::Json(err)) => {
                warn!(path = %self.path.display(), %err, "overwriting unreadable state file");
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, format!("{text}\n"))?;
        Ok(())
    }
}

/// In-memory store whose clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `set` fail, as a full or revoked store would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Unavailable);
        }
        self.insert_raw(key, value);
        Ok(())
    }
}

/// Loads and saves the record and notification cooldowns. Nothing here ever
/// fails outward: unreadable state becomes defaults and failed writes are
/// logged, leaving the caller's in-memory copy authoritative.
pub struct StateStore {
    backend: Box<dyn KeyValueStore>,
}

impl StateStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn load(&self) -> Record {
        match self.backend.get(RECORD_KEY) {
            Ok(Some(content)) => match parse_record_text(&content) {
                Ok(record) => record,
                Err(err) => {
                    warn!(%err, "stored record is corrupt, starting from defaults");
                    Record::default()
                }
            },
            Ok(None) => {
                debug!("no stored record, starting from defaults");
                Record::default()
            }
            Err(err) => {
                warn!(%err, "unable to read stored record, starting from defaults");
                Record::default()
            }
        }
    }

    pub fn save(&mut self, record: &Record) {
        let result =
            render_record_text(record).and_then(|text| self.backend.set(RECORD_KEY, &text));
        if let Err(err) = result {
            warn!(%err, "failed to persist record");
        }
    }

    pub fn load_cooldown(&self) -> NotificationCooldown {
        let last_interval_notify_at = self
            .read_key(LAST_NOTIFIED_KEY)
            .and_then(|text| text.trim().parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis);
        // A minute stored without its date cannot be placed on a day and is
        // ignored.
        let time = self
            .read_key(LAST_ALARM_MINUTE_KEY)
            .and_then(|text| text.parse::<AlarmTime>().ok());
        let date = self
            .read_key(LAST_ALARM_DATE_KEY)
            .and_then(|text| NaiveDate::parse_from_str(text.trim(), ALARM_DATE_FORMAT).ok());
        let last_alarm_minute_fired = time
            .zip(date)
            .map(|(time, date)| AlarmMinute::new(date, time));

        NotificationCooldown {
            last_interval_notify_at,
            last_alarm_minute_fired,
        }
    }

    /// Writes whichever cooldown fields are set. Cooldowns are never cleared,
    /// so an unset field has nothing to overwrite.
    pub fn save_cooldown(&mut self, cooldown: &NotificationCooldown) {
        if let Some(at) = cooldown.last_interval_notify_at
            && let Err(err) = self
                .backend
                .set(LAST_NOTIFIED_KEY, &at.timestamp_millis().to_string())
        {
            warn!(%err, "failed to persist interval cooldown");
        }
        if let Some(minute) = cooldown.last_alarm_minute_fired {
            let date = minute.date.format(ALARM_DATE_FORMAT).to_string();
            let result = self
                .backend
                .set(LAST_ALARM_MINUTE_KEY, &minute.time.to_string())
                .and_then(|()| self.backend.set(LAST_ALARM_DATE_KEY, &date));
            if let Err(err) = result {
                warn!(%err, "failed to persist alarm cooldown");
            }
        }
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, %err, "unable to read stored value");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn missing_record_loads_defaults() {
        let store = StateStore::new(MemoryKeyValueStore::new());
        assert_eq!(store.load(), Record::default());
    }

    #[test]
    fn corrupt_record_loads_defaults() {
        let backend = MemoryKeyValueStore::new();
        backend.insert_raw(RECORD_KEY, "{\"lastShower\": 12");
        let store = StateStore::new(backend);
        assert_eq!(store.load(), Record::default());
    }

    #[test]
    fn save_of_load_is_a_fixed_point() {
        let backend = MemoryKeyValueStore::new();
        backend.insert_raw(
            RECORD_KEY,
            r#"{"lastShower":"2026-03-02T07:15:30.123456Z","history":["3/2/2026, 2:15:30 AM"],"notificationsEnabled":true,"interval":12,"alarms":[{"time":"22:00","id":9},{"time":"06:30","id":4}]}"#,
        );
        let mut store = StateStore::new(backend.clone());

        store.save(&store.load());
        let first = backend.raw(RECORD_KEY).expect("saved");
        store.save(&store.load());
        let second = backend.raw(RECORD_KEY).expect("saved");
        assert_eq!(first, second);
    }

    #[test]
    fn failed_write_is_swallowed() {
        let backend = MemoryKeyValueStore::new();
        backend.set_fail_writes(true);
        let mut store = StateStore::new(backend.clone());

        let record = Record {
            interval_hours: 6,
            ..Record::default()
        };
        store.save(&record);
        assert!(backend.raw(RECORD_KEY).is_none());
    }

    #[test]
    fn cooldown_round_trips_through_secondary_keys() {
        let backend = MemoryKeyValueStore::new();
        let mut store = StateStore::new(backend.clone());
        let cooldown = NotificationCooldown {
            last_interval_notify_at: Utc
                .with_ymd_and_hms(2026, 3, 2, 8, 0, 0)
                .single(),
            last_alarm_minute_fired: AlarmTime::from_hm(7, 0).map(|time| {
                AlarmMinute::new(
                    NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date"),
                    time,
                )
            }),
        };

        store.save_cooldown(&cooldown);
        assert_eq!(
            backend.raw(LAST_NOTIFIED_KEY).as_deref(),
            Some("1772438400000")
        );
        assert_eq!(backend.raw(LAST_ALARM_MINUTE_KEY).as_deref(), Some("07:00"));
        assert_eq!(backend.raw(LAST_ALARM_DATE_KEY).as_deref(), Some("2026-03-02"));
        assert_eq!(store.load_cooldown(), cooldown);
    }

    #[test]
    fn alarm_minute_without_a_date_loads_as_unset() {
        let backend = MemoryKeyValueStore::new();
        backend.insert_raw(LAST_ALARM_MINUTE_KEY, "07:00");
        let store = StateStore::new(backend);
        assert_eq!(store.load_cooldown().last_alarm_minute_fired, None);
    }

    #[test]
    fn unreadable_cooldown_values_load_as_unset() {
        let backend = MemoryKeyValueStore::new();
        backend.insert_raw(LAST_NOTIFIED_KEY, "yesterday");
        backend.insert_raw(LAST_ALARM_MINUTE_KEY, "");
        let store = StateStore::new(backend);
        assert_eq!(store.load_cooldown(), NotificationCooldown::default());
    }

    #[test]
    fn file_store_keeps_keys_side_by_side() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("state.json");
        let mut backend = FileKeyValueStore::new(&path);

        assert_eq!(backend.get(RECORD_KEY).expect("read"), None);
        backend.set(RECORD_KEY, "{}").expect("write record");
        backend.set(LAST_ALARM_MINUTE_KEY, "07:00").expect("write minute");

        let reopened = FileKeyValueStore::new(&path);
        assert_eq!(reopened.get(RECORD_KEY).expect("read").as_deref(), Some("{}"));
        assert_eq!(
            reopened.get(LAST_ALARM_MINUTE_KEY).expect("read").as_deref(),
            Some("07:00")
        );
    }

    #[test]
    fn file_store_replaces_unreadable_file_on_write() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not-valid-json ").expect("write garbage");

        let mut backend = FileKeyValueStore::new(&path);
        assert!(backend.get(RECORD_KEY).is_err());
        backend.set(RECORD_KEY, "{}").expect("write over garbage");
        assert_eq!(backend.get(RECORD_KEY).expect("read").as_deref(), Some("{}"));
    }
}
