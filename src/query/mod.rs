//! Read side: history queries and the live "now" sample.

pub mod start_date;

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use crate::{
    db::{Database, Reading, DEFAULT_MAX_COUNT},
    sampling::LatestReading,
    sensor::{self, FrameSource, SensorError},
};

pub use start_date::{parse_start_date, since_millis_or_default};

/// Body of `/temperature_query.json`.
///
/// `current` is NaN until the sampler has accepted a reading; serde_json
/// writes non-finite floats as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub temperature_record: Vec<Reading>,
    pub current: f64,
}

/// Body of `/temperature_now.json`: exactly one fresh reading.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentResponse {
    pub temperature_record: Vec<Reading>,
}

/// `num_obs` as sent by a client. Only the leading integer counts, so `5abc`
/// asks for 5; no leading integer at all means the default.
pub fn max_count_or_default(value: Option<&str>) -> i64 {
    value.and_then(leading_integer).unwrap_or(DEFAULT_MAX_COUNT)
}

/// Optional sign followed by as many digits as are present. Overflow
/// saturates.
fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude = digits[..end]
        .bytes()
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));
    Some(if negative { -magnitude } else { magnitude })
}

#[derive(Clone)]
pub struct QueryService {
    db: Database,
    latest: LatestReading,
    source: Arc<dyn FrameSource>,
}

impl QueryService {
    pub fn new(db: Database, latest: LatestReading, source: Arc<dyn FrameSource>) -> Self {
        Self { db, latest, source }
    }

    /// History slice plus the cached latest value, which is attached even
    /// when it falls outside the requested window.
    pub async fn history(&self, max_count: i64, since_millis: i64) -> Result<HistoryResponse> {
        let temperature_record = self.db.query_readings(max_count, since_millis).await?;
        Ok(HistoryResponse {
            temperature_record,
            current: self.latest.get(),
        })
    }

    /// Parses raw request parameters, then runs [`Self::history`].
    pub async fn handle(
        &self,
        num_obs: Option<&str>,
        start_date: Option<&str>,
    ) -> Result<HistoryResponse> {
        let max_count = max_count_or_default(num_obs);
        let since_millis = since_millis_or_default(start_date);
        self.history(max_count, since_millis).await
    }

    /// Takes a brand-new sample. Nothing is stored and the cached latest
    /// value is left to the sampler.
    pub async fn current(&self) -> Result<CurrentResponse, SensorError> {
        let reading = sensor::sample(Arc::clone(&self.source)).await?;
        Ok(CurrentResponse {
            temperature_record: vec![reading],
        })
    }
}
