pub mod model;
pub mod scheduler;

pub use model::{Alarm, AlarmBook, AlarmId, AlarmInputError, AlarmMinute, AlarmTime};
