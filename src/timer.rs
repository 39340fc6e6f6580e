use std::fmt;

use chrono::{DateTime, Utc};

use crate::notify::NotificationRequest;
use crate::state::Record;

pub const PLACEHOLDER_ELAPSED: &str = "--:--:--";
pub const PLACEHOLDER_MESSAGE: &str = "Checking status...";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Urgency {
    Fresh,
    Warning,
    Overdue,
}

impl Urgency {
    /// Fresh below three quarters of the interval, Overdue from the full
    /// interval on, Warning in between. Works in whole hours.
    pub fn classify(elapsed_hours: u64, interval_hours: u32) -> Self {
        let interval = u64::from(interval_hours);
        if elapsed_hours.saturating_mul(4) < interval * 3 {
            Urgency::Fresh
        } else if elapsed_hours < interval {
            Urgency::Warning
        } else {
            Urgency::Overdue
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Urgency::Fresh => "You're all fresh!",
            Urgency::Warning => "Getting close to shower time...",
            Urgency::Overdue => "Time for a shower!",
        }
    }
}

/// Time since the last occurrence, truncated to whole seconds.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Elapsed {
    total_seconds: u64,
}

impl Elapsed {
    /// Saturates at zero when `to` is before `from`.
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        let millis = to.signed_duration_since(from).num_milliseconds().max(0);
        Self {
            total_seconds: (millis / 1_000) as u64,
        }
    }

    pub fn from_seconds(total_seconds: u64) -> Self {
        Self { total_seconds }
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    pub fn hours(&self) -> u64 {
        self.total_seconds / 3_600
    }

    pub fn minutes(&self) -> u64 {
        (self.total_seconds % 3_600) / 60
    }

    pub fn seconds(&self) -> u64 {
        self.total_seconds % 60
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours(),
            self.minutes(),
            self.seconds()
        )
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Status {
    pub urgency: Urgency,
    pub elapsed: Elapsed,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TimerOutcome {
    /// `None` until an occurrence has been recorded.
    pub status: Option<Status>,
    pub reminder: Option<NotificationRequest>,
}

pub fn status_at(now: DateTime<Utc>, record: &Record) -> Option<Status> {
    let last = record.last_occurrence?;
    let elapsed = Elapsed::between(last, now);
    Some(Status {
        urgency: Urgency::classify(elapsed.hours(), record.interval_hours),
        elapsed,
    })
}

/// One timer step: the current status plus an interval reminder request when
/// the habit is overdue and reminders are on. Cooldown is the gateway's job.
pub fn tick(now: DateTime<Utc>, record: &Record) -> TimerOutcome {
    let status = status_at(now, record);
    let reminder = match status {
        Some(Status {
            urgency: Urgency::Overdue,
            ..
        }) if record.notifications_enabled => Some(NotificationRequest::interval()),
        _ => None,
    };
    TimerOutcome { status, reminder }
}
