pub mod temperature_records;

pub use temperature_records::{DEFAULT_MAX_COUNT, EPOCH_START_MILLIS};
