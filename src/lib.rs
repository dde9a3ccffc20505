pub mod db;
pub mod query;
pub mod sampling;
pub mod sensor;
pub mod server;
pub mod settings;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use db::Database;
use query::QueryService;
use sampling::{LatestReading, SamplerController};
use sensor::{discover_device, DeviceFile, FrameSource};
use settings::Settings;

/// Everything the running service shares between the sampler and the
/// request handlers.
pub struct AppState {
    pub db: Database,
    pub latest: LatestReading,
    pub source: Arc<dyn FrameSource>,
    pub settings: Settings,
}

impl AppState {
    pub fn query_service(&self) -> QueryService {
        QueryService::new(self.db.clone(), self.latest.clone(), Arc::clone(&self.source))
    }
}

/// Resolves the sensor file: an explicit path wins, otherwise the first
/// non-master w1 device. Failing to find one is fatal.
pub fn resolve_device(settings: &Settings) -> Result<DeviceFile> {
    if let Some(path) = &settings.device_path {
        return Ok(DeviceFile::new(path.clone()));
    }

    let found = discover_device(&settings.devices_dir)?;
    if found.candidates > 1 {
        warn!(
            "more than one w1 device found ({}), using {}",
            found.candidates,
            found.device.display()
        );
    }
    Ok(DeviceFile::new(found.device))
}

pub fn init_state(settings: Settings) -> Result<AppState> {
    let device = resolve_device(&settings)?;
    // An unreadable sensor at startup is a configuration problem, not a
    // transient fault.
    device
        .read_frame()
        .with_context(|| format!("sensor {} is not readable", device.path().display()))?;
    info!("using sensor {}", device.path().display());

    let db = Database::new(settings.database_path.clone())?;

    Ok(AppState {
        db,
        latest: LatestReading::new(),
        source: Arc::new(device),
        settings,
    })
}

/// Runs the sampler and the HTTP server until `shutdown` fires.
pub async fn serve_until(state: AppState, shutdown: CancellationToken) -> Result<()> {
    let interval = state.settings.interval();
    let listener = server::bind(state.settings.port).await?;

    let mut sampler = SamplerController::new();
    sampler.start(
        Arc::clone(&state.source),
        state.db.clone(),
        state.latest.clone(),
        interval,
    )?;
    info!(
        "Server is logging to database at {}ms intervals",
        interval.as_millis()
    );

    let served = server::serve(listener, state.query_service(), shutdown.clone()).await;

    sampler.stop().await?;
    served
}

async fn start(settings: Settings) -> Result<()> {
    let state = init_state(settings)?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to listen for shutdown signal: {err}");
            return;
        }
        info!("shutdown requested");
        signal_token.cancel();
    });

    serve_until(state, shutdown).await
}

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("pitherm starting up...");

    let result = Settings::load().and_then(|settings| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start tokio runtime")?
            .block_on(start(settings))
    });

    if let Err(err) = result {
        error!("fatal: {err:#}");
        std::process::exit(1);
    }
}
