use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::db::{connection::Database, models::Reading};

/// Records returned when a caller does not say how many it wants.
pub const DEFAULT_MAX_COUNT: i64 = 20;
/// Exclusive lower bound used when a caller gives no start time.
pub const EPOCH_START_MILLIS: i64 = 0;

fn row_to_reading(row: &Row) -> rusqlite::Result<Reading> {
    Ok(Reading {
        unix_time: row.get("unix_time")?,
        celsius: row.get("celsius")?,
    })
}

/// SQLite reads any negative LIMIT as "no limit".
fn sql_limit(max_count: i64) -> i64 {
    if max_count < 0 {
        -1
    } else {
        max_count
    }
}

impl Database {
    pub async fn append_reading(&self, reading: &Reading) -> Result<()> {
        let record = *reading;
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO temperature_records (unix_time, celsius) VALUES (?1, ?2)",
                params![record.unix_time, record.celsius],
            )
            .with_context(|| format!("failed to insert reading at {}", record.unix_time))?;
            Ok(())
        })
        .await
    }

    /// The `max_count` newest readings strictly after `since_millis`, oldest
    /// first. A negative `max_count` returns the whole window.
    pub async fn query_readings(&self, max_count: i64, since_millis: i64) -> Result<Vec<Reading>> {
        let limit = sql_limit(max_count);
        self.read(move |conn| {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT unix_time, celsius FROM (
                        SELECT unix_time, celsius
                        FROM temperature_records
                        WHERE unix_time > ?1
                        ORDER BY unix_time DESC
                        LIMIT ?2
                    )
                    ORDER BY unix_time ASC",
                )
                .context("failed to prepare temperature query")?;

            let rows = stmt.query_map(params![since_millis, limit], row_to_reading)?;

            let mut readings = Vec::new();
            for row in rows {
                readings.push(row.context("failed to decode temperature record")?);
            }

            Ok(readings)
        })
        .await
    }

    pub async fn count_readings(&self) -> Result<u64> {
        self.read(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM temperature_records", [], |row| row.get(0))
                .context("failed to count temperature records")?;
            Ok(count.max(0) as u64)
        })
        .await
    }
}
