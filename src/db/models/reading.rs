//! Temperature reading data model.
//!
//! One row of the `temperature_records` table and one element of the
//! `temperature_record` array served over HTTP. Field names are part of the
//! wire format.

use serde::{Deserialize, Serialize};

/// A validated, timestamped temperature observation.
///
/// `unix_time` is milliseconds since the epoch, taken when the frame was
/// accepted. `celsius` is already rounded to one decimal and lies in
/// `[-128, 128)`; the validator is the only producer of fresh readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub unix_time: i64,
    pub celsius: f64,
}

impl Reading {
    pub fn new(unix_time: i64, celsius: f64) -> Self {
        Self { unix_time, celsius }
    }
}
