use std::sync::Arc;

use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    db::{Database, Reading},
    sensor::{self, FrameSource, SensorError},
};

use super::latest::LatestReading;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// A w1 read normally takes ~750 ms; anything this slow is a wedged bus.
const SAMPLE_TIMEOUT_SECS: u64 = 30;

/// What a single sampling cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Stored(Reading),
    /// Valid reading, but the append failed and the reading was dropped.
    NotStored(Reading),
    /// Device unreadable, frame rejected, or the read timed out.
    Skipped,
}

/// Samples immediately, then once per `interval`, until cancelled. A bad
/// cycle is logged and skipped; the loop itself never exits on its own.
pub async fn sampling_loop(
    source: Arc<dyn FrameSource>,
    db: Database,
    latest: LatestReading,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    // The first tick completes immediately, which gives the startup sample.
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!("sampling {} every {:?}", source.describe(), interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_cycle(&source, &db, &latest).await;
            }
            _ = cancel_token.cancelled() => {
                log_info!("sampling loop shutting down");
                break;
            }
        }
    }
}

/// Read, validate, publish, store. Conversion always finishes before the
/// append starts.
pub async fn run_cycle(
    source: &Arc<dyn FrameSource>,
    db: &Database,
    latest: &LatestReading,
) -> CycleOutcome {
    let cycle_start = Instant::now();
    let fut = sensor::sample(Arc::clone(source));

    let reading = match tokio::time::timeout(Duration::from_secs(SAMPLE_TIMEOUT_SECS), fut).await {
        Ok(Ok(reading)) => reading,
        Ok(Err(SensorError::InvalidFrame(invalid))) => {
            log_warn!(
                "rejected frame from {} ({}), not storing; raw data:\n{}",
                source.describe(),
                invalid.reason,
                invalid.raw
            );
            return CycleOutcome::Skipped;
        }
        Ok(Err(err)) => {
            log_error!("sensor read failed, skipping cycle: {err}");
            return CycleOutcome::Skipped;
        }
        Err(_) => {
            log_warn!(
                "sensor read timed out (> {}s) on {}, skipping cycle",
                SAMPLE_TIMEOUT_SECS,
                source.describe()
            );
            return CycleOutcome::Skipped;
        }
    };

    latest.set(reading.celsius);

    match db.append_reading(&reading).await {
        Ok(()) => {
            log_debug!(
                "stored {} °C at {} in {}ms",
                reading.celsius,
                reading.unix_time,
                cycle_start.elapsed().as_millis()
            );
            CycleOutcome::Stored(reading)
        }
        Err(err) => {
            log_error!("failed to store reading {:?}, dropping it: {err:?}", reading);
            CycleOutcome::NotStored(reading)
        }
    }
}
