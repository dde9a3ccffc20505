use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

pub const DEFAULT_DEVICES_DIR: &str = "/sys/bus/w1/devices";
const BUS_MASTER_MARKER: &str = "w1_bus_master";
const DEVICE_FILE: &str = "w1_slave";

#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    pub device: PathBuf,
    /// Number of non-master entries seen, including the chosen one.
    pub candidates: usize,
}

/// Picks the lexicographically first non-bus-master entry under `devices_dir`.
pub fn discover_device(devices_dir: &Path) -> Result<Discovery> {
    let entries = std::fs::read_dir(devices_dir).with_context(|| {
        format!(
            "failed to list w1 devices in {}; are w1-gpio and w1-therm loaded?",
            devices_dir.display()
        )
    })?;

    let mut names: Vec<String> = entries
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.contains(BUS_MASTER_MARKER))
        .collect();
    names.sort();

    let Some(first) = names.first() else {
        bail!(
            "no w1 devices in {}; are w1-gpio and w1-therm loaded?",
            devices_dir.display()
        );
    };

    Ok(Discovery {
        device: devices_dir.join(first).join(DEVICE_FILE),
        candidates: names.len(),
    })
}
