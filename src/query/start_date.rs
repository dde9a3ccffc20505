use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::db::EPOCH_START_MILLIS;

const ENABLE_LOGS: bool = true;

use crate::log_debug;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Epoch milliseconds for an ISO-like timestamp. Zone-less input is UTC.
pub fn parse_start_date(value: &str) -> Option<i64> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Like [`parse_start_date`], but anything unparseable means "from the
/// beginning".
pub fn since_millis_or_default(value: Option<&str>) -> i64 {
    match value {
        Some(raw) => parse_start_date(raw).unwrap_or_else(|| {
            log_debug!("unparseable start_date {raw:?}, querying from epoch");
            EPOCH_START_MILLIS
        }),
        None => EPOCH_START_MILLIS,
    }
}
