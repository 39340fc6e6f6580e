//! Reminder delivery: permission handling, per-channel cooldowns and the
//! surfaces that actually show a notification.
//!
//! Two channels share one surface. The interval channel is rate limited by
//! time since its last delivery; the alarm channel is debounced by the
//! wall-clock minute it last fired in. Neither channel's bookkeeping is
//! consulted by the other.

mod gateway;
mod surface;

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use crate::alarm::{AlarmMinute, AlarmTime};

pub use gateway::NotificationGateway;
pub use surface::{DeliveredNotification, RecordingSurface, TerminalSurface};

pub const INTERVAL_COOLDOWN_SECS: i64 = 3_600;
pub const NOTIFICATION_ICON: &str = "https://cdn-icons-png.flaticon.com/512/3100/3100824.png";

pub const INTERVAL_TITLE: &str = "Shower Reminder";
pub const INTERVAL_BODY: &str = "It's been a while since your last shower. Time to get fresh!";
pub const ALARM_TITLE: &str = "Shower Alarm";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PermissionState {
    Granted,
    Denied,
    Unsupported,
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionState::Granted => f.write_str("permission granted"),
            PermissionState::Denied => f.write_str("permission was denied"),
            PermissionState::Unsupported => {
                f.write_str("desktop notifications are not supported here")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum NotificationKind {
    Interval,
    Alarm,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NotificationRequest {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
}

impl NotificationRequest {
    pub fn interval() -> Self {
        Self {
            kind: NotificationKind::Interval,
            title: INTERVAL_TITLE.to_string(),
            body: INTERVAL_BODY.to_string(),
        }
    }

    pub fn alarm(minute: AlarmTime) -> Self {
        Self {
            kind: NotificationKind::Alarm,
            title: ALARM_TITLE.to_string(),
            body: format!("It's {minute}. Time for your scheduled shower!"),
        }
    }
}

/// The external thing that can show a notification to the user.
pub trait NotificationSurface {
    fn permission(&self) -> PermissionState;
    /// Blocks until the user (or platform) answers.
    fn request_permission(&mut self) -> PermissionState;
    fn show(&mut self, title: &str, body: &str, icon: &str);
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct NotificationCooldown {
    pub last_interval_notify_at: Option<DateTime<Utc>>,
    pub last_alarm_minute_fired: Option<AlarmMinute>,
}

impl NotificationCooldown {
    pub fn interval_allows(&self, now: DateTime<Utc>) -> bool {
        match self.last_interval_notify_at {
            Some(last) => {
                now.signed_duration_since(last) >= TimeDelta::seconds(INTERVAL_COOLDOWN_SECS)
            }
            None => true,
        }
    }

    pub fn mark_interval(&mut self, now: DateTime<Utc>) {
        self.last_interval_notify_at = Some(now);
    }

    pub fn alarm_minute_allows(&self, minute: AlarmMinute) -> bool {
        self.last_alarm_minute_fired != Some(minute)
    }

    pub fn mark_alarm_minute(&mut self, minute: AlarmMinute) {
        self.last_alarm_minute_fired = Some(minute);
    }
}
