pub mod record;
pub mod store;

pub use record::{DEFAULT_INTERVAL_HOURS, Record, parse_record_text, render_record_text};
pub use store::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StateStore, StoreError,
};
