use chrono::{DateTime, Days, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc};
use tracing::debug;

use crate::alarm::model::{Alarm, AlarmMinute};
use crate::notify::{NotificationCooldown, NotificationRequest};
use crate::state::Record;

/// An alarm stays quiet if the habit was done at most this long ago.
pub const ALARM_GUARD_HOURS: i64 = 12;

/// Checks whether an alarm matches the wall-clock minute of `now`.
///
/// The minute debounce is global and keyed on the local date as well as the
/// time: once any alarm fired in a minute, further ticks in that minute emit
/// nothing, and the same alarm is free to fire again the next day. A
/// never-recorded occurrence counts as infinitely long ago.
pub fn check<Tz: TimeZone>(
    now: &DateTime<Tz>,
    record: &Record,
    cooldown: &mut NotificationCooldown,
) -> Option<NotificationRequest> {
    if !record.notifications_enabled || record.alarms.is_empty() {
        return None;
    }

    let minute = AlarmMinute::from_datetime(now);
    if !cooldown.alarm_minute_allows(minute) {
        return None;
    }

    let alarm = record.alarms.find_by_time(minute.time)?;
    let last = record.last_occurrence.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let since = now.with_timezone(&Utc).signed_duration_since(last);
    if since <= TimeDelta::hours(ALARM_GUARD_HOURS) {
        debug!(alarm = alarm.id, %minute, "alarm skipped, occurrence is recent");
        return None;
    }

    cooldown.mark_alarm_minute(minute);
    debug!(alarm = alarm.id, %minute, "alarm matched");
    Some(NotificationRequest::alarm(minute.time))
}

/// The next instant, strictly after `now`, at which one of the alarms will
/// match. Wall-clock times skipped by a DST jump are passed over.
pub fn next_alarm<Tz: TimeZone>(now: &DateTime<Tz>, record: &Record) -> Option<(Alarm, DateTime<Tz>)> {
    let timezone = now.timezone();
    for day_offset in 0_u64..=2 {
        let date = now.date_naive().checked_add_days(Days::new(day_offset))?;
        for alarm in &record.alarms {
            let naive = date.and_time(alarm.time.as_naive());
            let Some(candidate) = resolve_local_datetime(&timezone, naive) else {
                continue;
            };
            if candidate > *now {
                return Some((alarm.clone(), candidate));
            }
        }
    }
    None
}

fn resolve_local_datetime<Tz: TimeZone>(timezone: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match timezone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(first, _second) => Some(first),
        LocalResult::None => None,
    }
}
