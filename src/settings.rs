use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::sensor::discovery::DEFAULT_DEVICES_DIR;

pub const CONFIG_ENV: &str = "PITHERM_CONFIG";
const INTERVAL_ENV: &str = "PITHERM_INTERVAL_MINUTES";
const PORT_ENV: &str = "PITHERM_PORT";
const DB_ENV: &str = "PITHERM_DB";
const DEVICES_DIR_ENV: &str = "PITHERM_DEVICES_DIR";
const DEVICE_ENV: &str = "PITHERM_DEVICE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub interval_minutes: u64,
    pub port: u16,
    pub database_path: PathBuf,
    pub devices_dir: PathBuf,
    /// Skips discovery when set.
    pub device_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval_minutes: 15,
            port: 8000,
            database_path: PathBuf::from("piTemps.db"),
            devices_dir: PathBuf::from(DEFAULT_DEVICES_DIR),
            device_path: None,
        }
    }
}

impl Settings {
    /// Defaults, then the JSON file named by `PITHERM_CONFIG`, then the
    /// individual `PITHERM_*` variables.
    pub fn load() -> Result<Self> {
        Self::from_sources(|key| std::env::var(key).ok())
    }

    pub fn from_sources<F>(env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match env(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(raw) = env(INTERVAL_ENV) {
            settings.interval_minutes = raw
                .trim()
                .parse()
                .with_context(|| format!("{INTERVAL_ENV}={raw:?} is not a whole number of minutes"))?;
        }
        if let Some(raw) = env(PORT_ENV) {
            settings.port = raw
                .trim()
                .parse()
                .with_context(|| format!("{PORT_ENV}={raw:?} is not a port number"))?;
        }
        if let Some(raw) = env(DB_ENV) {
            settings.database_path = PathBuf::from(raw);
        }
        if let Some(raw) = env(DEVICES_DIR_ENV) {
            settings.devices_dir = PathBuf::from(raw);
        }
        if let Some(raw) = env(DEVICE_ENV) {
            settings.device_path = Some(PathBuf::from(raw));
        }

        settings.validate()?;
        Ok(settings)
    }

    /// A missing file means defaults; a broken one is an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_minutes == 0 {
            bail!("sampling interval must be at least 1 minute");
        }
        if self.port == 0 {
            bail!("port must be between 1 and 65535");
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}
