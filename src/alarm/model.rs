use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Timelike};
use thiserror::Error;

pub type AlarmId = u64;

/// A wall-clock minute in 24h form, displayed as zero-padded `HH:MM`.
///
/// Ordering is chronological, which for the fixed-width text form is the
/// same as lexicographic ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlarmTime(NaiveTime);

impl AlarmTime {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// The minute `now` falls in, read off its own wall clock.
    pub fn from_datetime<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self(NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(NaiveTime::MIN))
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for AlarmTime {
    type Err = AlarmInputError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AlarmInputError::Empty);
        }
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .map(Self)
            .map_err(|_| AlarmInputError::Malformed(trimmed.to_string()))
    }
}

/// A wall-clock minute on a particular local date. Alarms are debounced on
/// this, so the same `HH:MM` fires again on the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlarmMinute {
    pub date: NaiveDate,
    pub time: AlarmTime,
}

impl AlarmMinute {
    pub fn new(date: NaiveDate, time: AlarmTime) -> Self {
        Self { date, time }
    }

    pub fn from_datetime<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self {
            date: now.date_naive(),
            time: AlarmTime::from_datetime(now),
        }
    }
}

impl fmt::Display for AlarmMinute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.time)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlarmInputError {
    #[error("alarm time is empty")]
    Empty,
    #[error("invalid alarm time '{0}', expected HH:MM")]
    Malformed(String),
    #[error("an alarm for {0} already exists")]
    Duplicate(AlarmTime),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub id: AlarmId,
    pub time: AlarmTime,
}

/// The user's daily alarms: unique by time, kept sorted by time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmBook {
    alarms: Vec<Alarm>,
}

impl AlarmBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `input` and adds an alarm for it. The id is `now_millis` unless
    /// that would not be greater than every id already handed out.
    pub fn add(&mut self, input: &str, now_millis: i64) -> Result<&Alarm, AlarmInputError> {
        let time = input.parse::<AlarmTime>()?;
        let id = self.next_id(now_millis);
        self.insert(Alarm { id, time })
    }

    pub fn insert(&mut self, alarm: Alarm) -> Result<&Alarm, AlarmInputError> {
        match self
            .alarms
            .binary_search_by_key(&alarm.time, |existing| existing.time)
        {
            Ok(_) => Err(AlarmInputError::Duplicate(alarm.time)),
            Err(index) => {
                self.alarms.insert(index, alarm);
                Ok(&self.alarms[index])
            }
        }
    }

    pub fn remove(&mut self, id: AlarmId) -> Option<Alarm> {
        let index = self.alarms.iter().position(|alarm| alarm.id == id)?;
        Some(self.alarms.remove(index))
    }

    pub fn find_by_time(&self, time: AlarmTime) -> Option<&Alarm> {
        self.alarms.iter().find(|alarm| alarm.time == time)
    }

    pub fn clear(&mut self) {
        self.alarms.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Alarm> {
        self.alarms.iter()
    }

    pub fn as_slice(&self) -> &[Alarm] {
        &self.alarms
    }

    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    fn next_id(&self, now_millis: i64) -> AlarmId {
        let candidate = AlarmId::try_from(now_millis).unwrap_or(0);
        let floor = self
            .alarms
            .iter()
            .map(|alarm| alarm.id.saturating_add(1))
            .max()
            .unwrap_or(0);
        candidate.max(floor)
    }
}

impl<'a> IntoIterator for &'a AlarmBook {
    type Item = &'a Alarm;
    type IntoIter = std::slice::Iter<'a, Alarm>;

    fn into_iter(self) -> Self::IntoIter {
        self.alarms.iter()
    }
}
