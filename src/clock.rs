use std::cell::Cell;

use chrono::{DateTime, Local, TimeDelta};

/// Where the tick loop reads the current wall-clock time from.
pub trait TimeSource {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that starts at a fixed instant and advances by `step` every time
/// it is read. Lets a tick loop be driven through hours of simulated time.
pub struct SteppingClock {
    next: Cell<DateTime<Local>>,
    step: TimeDelta,
}

impl SteppingClock {
    pub fn new(start: DateTime<Local>, step: TimeDelta) -> Self {
        Self {
            next: Cell::new(start),
            step,
        }
    }
}

impl TimeSource for SteppingClock {
    fn now(&self) -> DateTime<Local> {
        let current = self.next.get();
        self.next.set(current + self.step);
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepping_clock_advances_per_read() {
        let start = Local::now();
        let clock = SteppingClock::new(start, TimeDelta::minutes(10));
        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start + TimeDelta::minutes(10));
        assert_eq!(clock.now(), start + TimeDelta::minutes(20));
    }

    #[test]
    fn system_clock_moves_forward() {
        let first = SystemClock.now();
        let second = SystemClock.now();
        assert!(second >= first);
    }
}
