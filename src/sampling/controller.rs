use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{db::Database, sensor::FrameSource};

use super::{latest::LatestReading, loop_worker::sampling_loop};

/// Owns the background sampling task.
pub struct SamplerController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl Default for SamplerController {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplerController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(
        &mut self,
        source: Arc<dyn FrameSource>,
        db: Database,
        latest: LatestReading,
        interval: Duration,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("sampler already running");
        }
        if interval.is_zero() {
            bail!("sampling interval must be greater than zero");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sampling_loop(
            source,
            db,
            latest,
            interval,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("sampling loop task failed to join")?;
            info!("sampler stopped");
        }
        Ok(())
    }
}
