//! Habit tracker engine: elapsed-time status against a configurable
//! interval, a bounded occurrence history, daily alarms, and reminders
//! delivered through one notification surface with per-channel cooldowns.

pub mod alarm;
pub mod clock;
pub mod history;
pub mod logging;
pub mod notify;
pub mod render;
pub mod runtime;
pub mod state;
pub mod timer;
pub mod tracker;

pub use tracker::{Command, CommandError, TickReport, Tracker};
