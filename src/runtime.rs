use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::clock::TimeSource;
use crate::tracker::Tracker;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Cloneable flag that ends [`run`] before its next tick.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub period: Duration,
    pub max_ticks: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            period: TICK_PERIOD,
            max_ticks: None,
        }
    }
}

/// Ticks `tracker` once per period until stopped. Each tick finishes before
/// the next is scheduled, and slots missed while the process was busy or
/// suspended are dropped rather than replayed. Returns the number of ticks.
pub fn run(
    tracker: &mut Tracker,
    clock: &dyn TimeSource,
    options: &RunOptions,
    stop: &StopHandle,
) -> u64 {
    let period = options.period.max(Duration::from_millis(1));
    let mut ticks = 0_u64;
    let mut next_tick = Instant::now();

    loop {
        if stop.is_stopped() || options.max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }
        sleep_until(next_tick);
        if stop.is_stopped() {
            break;
        }

        let report = tracker.tick(&clock.now());
        ticks += 1;
        trace!(ticks, delivered = report.delivered.len(), "tick");

        let wake = Instant::now();
        next_tick += period;
        let mut skipped = 0_u64;
        while next_tick <= wake {
            next_tick += period;
            skipped += 1;
        }
        if skipped > 0 {
            debug!(skipped, "tick loop fell behind, dropping missed ticks");
        }
    }

    ticks
}

fn sleep_until(deadline: Instant) {
    let now = Instant::now();
    if now < deadline {
        thread::sleep(deadline.saturating_duration_since(now));
    }
}
