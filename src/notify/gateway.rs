use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{
    NOTIFICATION_ICON, NotificationCooldown, NotificationKind, NotificationRequest,
    NotificationSurface, PermissionState,
};

/// Gates every reminder on permission and on its channel's cooldown before
/// handing it to the surface.
pub struct NotificationGateway {
    surface: Box<dyn NotificationSurface>,
}

impl NotificationGateway {
    pub fn new(surface: impl NotificationSurface + 'static) -> Self {
        Self {
            surface: Box::new(surface),
        }
    }

    pub fn permission(&self) -> PermissionState {
        self.surface.permission()
    }

    /// Prompts only when permission is not already settled.
    pub fn request_permission(&mut self) -> PermissionState {
        let current = self.surface.permission();
        if matches!(
            current,
            PermissionState::Granted | PermissionState::Unsupported
        ) {
            return current;
        }
        let answer = self.surface.request_permission();
        info!(?answer, "notification permission answered");
        answer
    }

    /// Returns whether the reminder was shown.
    pub fn dispatch(
        &mut self,
        request: &NotificationRequest,
        cooldown: &mut NotificationCooldown,
        now: DateTime<Utc>,
    ) -> bool {
        let permission = self.surface.permission();
        if permission != PermissionState::Granted {
            debug!(kind = ?request.kind, ?permission, "reminder dropped without permission");
            return false;
        }

        match request.kind {
            NotificationKind::Interval => {
                if !cooldown.interval_allows(now) {
                    debug!("interval reminder suppressed by cooldown");
                    return false;
                }
                cooldown.mark_interval(now);
            }
            // Already debounced per minute by the scheduler.
            NotificationKind::Alarm => {}
        }

        self.surface
            .show(&request.title, &request.body, NOTIFICATION_ICON);
        info!(kind = ?request.kind, title = %request.title, "reminder delivered");
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;
    use crate::alarm::AlarmTime;
    use crate::notify::RecordingSurface;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0)
            .single()
            .expect("valid")
    }

    #[test]
    fn nothing_is_shown_without_permission() {
        let surface = RecordingSurface::with_permission(PermissionState::Denied);
        let mut gateway = NotificationGateway::new(surface.clone());
        let mut cooldown = NotificationCooldown::default();

        let shown = gateway.dispatch(&NotificationRequest::interval(), &mut cooldown, at(9, 0));
        assert!(!shown);
        assert!(surface.delivered().is_empty());
        assert_eq!(cooldown, NotificationCooldown::default());
    }

    #[test]
    fn interval_reminders_respect_the_hourly_cooldown() {
        let surface = RecordingSurface::granted();
        let mut gateway = NotificationGateway::new(surface.clone());
        let mut cooldown = NotificationCooldown::default();
        let request = NotificationRequest::interval();

        assert!(gateway.dispatch(&request, &mut cooldown, at(9, 0)));
        assert!(!gateway.dispatch(&request, &mut cooldown, at(9, 1)));
        assert!(!gateway.dispatch(&request, &mut cooldown, at(9, 59)));
        assert!(gateway.dispatch(&request, &mut cooldown, at(10, 0)));

        let delivered = surface.delivered();
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[0].title, "Shower Reminder");
        assert_eq!(delivered[0].icon, NOTIFICATION_ICON);
        assert_eq!(cooldown.last_interval_notify_at, Some(at(10, 0)));
    }

    #[test]
    fn alarm_reminders_bypass_the_interval_cooldown() {
        let surface = RecordingSurface::granted();
        let mut gateway = NotificationGateway::new(surface.clone());
        let mut cooldown = NotificationCooldown::default();
        cooldown.mark_interval(at(7, 0));

        let request = NotificationRequest::alarm(AlarmTime::from_hm(7, 0).expect("valid"));
        assert!(gateway.dispatch(&request, &mut cooldown, at(7, 0)));
        assert!(gateway.dispatch(&request, &mut cooldown, at(7, 0) + TimeDelta::seconds(1)));
        assert_eq!(surface.delivered().len(), 2);
    }

    #[test]
    fn settled_permission_is_not_requested_again() {
        let surface = RecordingSurface::granted();
        let mut gateway = NotificationGateway::new(surface.clone());
        assert_eq!(gateway.request_permission(), PermissionState::Granted);
        assert_eq!(surface.permission_requests(), 0);

        let unsupported = RecordingSurface::with_permission(PermissionState::Unsupported);
        let mut gateway = NotificationGateway::new(unsupported.clone());
        assert_eq!(gateway.request_permission(), PermissionState::Unsupported);
        assert_eq!(unsupported.permission_requests(), 0);
    }

    #[test]
    fn undecided_permission_prompts_the_surface() {
        let surface = RecordingSurface::answering(PermissionState::Granted);
        let mut gateway = NotificationGateway::new(surface.clone());
        assert_eq!(gateway.permission(), PermissionState::Denied);
        assert_eq!(gateway.request_permission(), PermissionState::Granted);
        assert_eq!(surface.permission_requests(), 1);
        assert_eq!(gateway.permission(), PermissionState::Granted);
    }
}
