use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::alarm::{Alarm, AlarmBook, AlarmTime};
use crate::history::{self, HISTORY_CAPACITY};
use crate::state::store::StoreError;

pub const DEFAULT_INTERVAL_HOURS: u32 = 24;

/// Everything the tracker persists about the user's habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub last_occurrence: Option<DateTime<Utc>>,
    /// Human-readable entries, newest first.
    pub history: Vec<String>,
    pub notifications_enabled: bool,
    pub interval_hours: u32,
    pub alarms: AlarmBook,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            last_occurrence: None,
            history: Vec::new(),
            notifications_enabled: false,
            interval_hours: DEFAULT_INTERVAL_HOURS,
            alarms: AlarmBook::new(),
        }
    }
}

impl Record {
    /// Forgets every occurrence and alarm. Preferences survive.
    pub fn reset(&mut self) {
        self.last_occurrence = None;
        history::clear(self);
        self.alarms.clear();
    }
}

pub fn parse_record_text(content: &str) -> Result<Record, StoreError> {
    let raw = serde_json::from_str::<RecordFile>(content)?;

    let last_occurrence = match raw.last_shower.as_deref() {
        None => None,
        Some(text) => match DateTime::parse_from_rfc3339(text) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc).trunc_subsecs(3)),
            Err(err) => {
                warn!(value = text, %err, "dropping unreadable lastShower timestamp");
                None
            }
        },
    };

    let interval_hours = match parse_interval(&raw.interval) {
        Some(hours) if hours > 0 => hours,
        _ => {
            warn!(value = %raw.interval, "unusable stored interval, using {DEFAULT_INTERVAL_HOURS}h");
            DEFAULT_INTERVAL_HOURS
        }
    };

    let mut history = raw.history;
    history.truncate(HISTORY_CAPACITY);

    let mut alarms = AlarmBook::new();
    for alarm in raw.alarms {
        let time = match alarm.time.parse::<AlarmTime>() {
            Ok(time) => time,
            Err(err) => {
                warn!(id = alarm.id, %err, "dropping stored alarm");
                continue;
            }
        };
        if let Err(err) = alarms.insert(Alarm { id: alarm.id, time }) {
            warn!(id = alarm.id, %err, "dropping stored alarm");
        }
    }

    Ok(Record {
        last_occurrence,
        history,
        notifications_enabled: raw.notifications_enabled,
        interval_hours,
        alarms,
    })
}

pub fn render_record_text(record: &Record) -> Result<String, StoreError> {
    let payload = RecordFile {
        last_shower: record
            .last_occurrence
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        history: record.history.clone(),
        notifications_enabled: record.notifications_enabled,
        interval: Value::from(record.interval_hours),
        alarms: record
            .alarms
            .iter()
            .map(|alarm| AlarmFile {
                time: alarm.time.to_string(),
                id: alarm.id,
            })
            .collect(),
    };
    Ok(serde_json::to_string(&payload)?)
}

// Older blobs may lack any field, `alarms` most often.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordFile {
    #[serde(default)]
    last_shower: Option<String>,
    #[serde(default)]
    history: Vec<String>,
    #[serde(default)]
    notifications_enabled: bool,
    #[serde(default = "default_interval")]
    interval: Value,
    #[serde(default)]
    alarms: Vec<AlarmFile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AlarmFile {
    time: String,
    id: u64,
}

fn default_interval() -> Value {
    Value::from(DEFAULT_INTERVAL_HOURS)
}

/// Whole hours from a stored interval. Numbers are truncated; strings are read
/// up to the first non-digit, so `"24"` and `"36h"` both load.
fn parse_interval(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|hours| hours.is_finite() && *hours >= 0.0)
                    .map(|hours| hours.trunc() as u64)
            })
            .and_then(|hours| u32::try_from(hours).ok()),
        Value::String(text) => {
            let text = text.trim();
            let digits = text
                .find(|c: char| !c.is_ascii_digit())
                .map_or(text, |end| &text[..end]);
            digits.parse().ok()
        }
        _ => None,
    }
}
