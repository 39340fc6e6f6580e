use chrono::{DateTime, TimeZone};

use crate::state::Record;

pub const HISTORY_CAPACITY: usize = 10;

/// Formats an occurrence the way it is shown in the history list, on the
/// wall clock of `at`'s zone, e.g. `3/2/2026, 7:05:09 AM`.
pub fn format_entry<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    at.naive_local()
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

/// Prepends an entry for `at`, dropping the oldest beyond capacity.
pub fn record<Tz: TimeZone>(record: &mut Record, at: &DateTime<Tz>) {
    record.history.insert(0, format_entry(at));
    record.history.truncate(HISTORY_CAPACITY);
}

pub fn clear(record: &mut Record) {
    record.history.clear();
}
