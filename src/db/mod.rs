pub mod connection;
mod migrations;
pub mod models;
pub mod repositories;

pub use connection::Database;
pub use models::Reading;
pub use repositories::{DEFAULT_MAX_COUNT, EPOCH_START_MILLIS};
