use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::alarm::{AlarmId, AlarmInputError, scheduler};
use crate::history;
use crate::notify::{
    NotificationCooldown, NotificationGateway, NotificationKind, NotificationRequest,
    PermissionState,
};
use crate::render::{Renderer, View};
use crate::state::{Record, StateStore};
use crate::timer::{self, Status};

/// Everything a user can do to the tracker.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Command {
    MarkOccurrence,
    SetInterval(u32),
    AddAlarm(String),
    DeleteAlarm(AlarmId),
    ToggleNotifications(bool),
    Reset,
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum CommandError {
    #[error(transparent)]
    InvalidAlarmInput(#[from] AlarmInputError),
    #[error("interval must be at least one hour")]
    InvalidInterval,
    #[error("no alarm with id {0}")]
    UnknownAlarm(AlarmId),
    #[error("notifications unavailable: {0}")]
    NotificationsUnavailable(PermissionState),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TickReport {
    pub status: Option<Status>,
    pub delivered: Vec<NotificationKind>,
}

/// Sole owner of the record and cooldowns. Every mutation goes through
/// [`Tracker::apply`] or [`Tracker::tick`], is persisted immediately and is
/// followed by a render.
pub struct Tracker {
    store: StateStore,
    gateway: NotificationGateway,
    renderer: Box<dyn Renderer>,
    record: Record,
    cooldown: NotificationCooldown,
    status: Option<Status>,
}

impl Tracker {
    pub fn open(
        store: StateStore,
        gateway: NotificationGateway,
        renderer: impl Renderer + 'static,
    ) -> Self {
        let record = store.load();
        let cooldown = store.load_cooldown();
        debug!(
            alarms = record.alarms.len(),
            interval_hours = record.interval_hours,
            "tracker state loaded"
        );
        Self {
            store,
            gateway,
            renderer: Box::new(renderer),
            record,
            cooldown,
            status: None,
        }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn cooldown(&self) -> &NotificationCooldown {
        &self.cooldown
    }

    /// Status as of the last tick or refresh.
    pub fn status(&self) -> Option<Status> {
        self.status
    }

    pub fn apply<Tz: TimeZone>(
        &mut self,
        command: Command,
        now: &DateTime<Tz>,
    ) -> Result<(), CommandError> {
        match command {
            Command::MarkOccurrence => {
                let at = now.with_timezone(&Utc).trunc_subsecs(3);
                self.record.last_occurrence = Some(at);
                history::record(&mut self.record, now);
                info!(%at, "occurrence marked");
            }
            Command::SetInterval(hours) => {
                if hours == 0 {
                    return Err(CommandError::InvalidInterval);
                }
                self.record.interval_hours = hours;
                info!(hours, "interval changed");
            }
            Command::AddAlarm(input) => {
                let alarm = self.record.alarms.add(&input, now.timestamp_millis())?;
                info!(id = alarm.id, time = %alarm.time, "alarm added");
            }
            Command::DeleteAlarm(id) => {
                let alarm = self
                    .record
                    .alarms
                    .remove(id)
                    .ok_or(CommandError::UnknownAlarm(id))?;
                info!(id, time = %alarm.time, "alarm removed");
            }
            Command::ToggleNotifications(false) => {
                self.record.notifications_enabled = false;
                info!("notifications disabled");
            }
            Command::ToggleNotifications(true) => {
                let permission = self.gateway.request_permission();
                if permission != PermissionState::Granted {
                    warn!(?permission, "notifications could not be enabled");
                    self.record.notifications_enabled = false;
                    self.commit(now);
                    return Err(CommandError::NotificationsUnavailable(permission));
                }
                self.record.notifications_enabled = true;
                info!("notifications enabled");
            }
            Command::Reset => {
                self.record.reset();
                info!("history reset");
            }
        }
        self.commit(now);
        Ok(())
    }

    /// One engine step: interval reminder first, then alarms. The two
    /// channels keep separate cooldowns, so both may deliver on one tick.
    pub fn tick<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> TickReport {
        let now_utc = now.with_timezone(&Utc);
        let before = self.cooldown.clone();
        let mut delivered = Vec::new();

        let outcome = timer::tick(now_utc, &self.record);
        if let Some(request) = outcome.reminder
            && self.deliver(&request, now_utc)
        {
            delivered.push(request.kind);
        }

        if let Some(request) = scheduler::check(now, &self.record, &mut self.cooldown)
            && self.deliver(&request, now_utc)
        {
            delivered.push(request.kind);
        }

        if self.cooldown != before {
            self.store.save_cooldown(&self.cooldown);
        }

        self.status = outcome.status;
        self.render();
        TickReport {
            status: outcome.status,
            delivered,
        }
    }

    /// Recomputes the status and re-renders without touching reminders.
    pub fn refresh<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Option<Status> {
        self.status = timer::status_at(now.with_timezone(&Utc), &self.record);
        self.render();
        self.status
    }

    fn deliver(&mut self, request: &NotificationRequest, now: DateTime<Utc>) -> bool {
        self.gateway.dispatch(request, &mut self.cooldown, now)
    }

    fn commit<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) {
        self.store.save(&self.record);
        self.refresh(now);
    }

    fn render(&mut self) {
        let view = View {
            record: &self.record,
            status: self.status,
        };
        self.renderer.render(&view);
    }
}
