use std::path::{Path, PathBuf};

use super::error::SensorError;

/// Two-line payload exposed by the w1-therm kernel driver, e.g.
///
/// ```text
/// 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
/// 72 01 4b 46 7f ff 0e 10 57 t=23125
/// ```
///
/// Never persisted; only the validator looks inside.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub integrity_line: String,
    pub data_line: Option<String>,
    raw: String,
}

impl RawFrame {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut lines = raw.lines();
        let integrity_line = lines.next().unwrap_or_default().to_string();
        let data_line = lines.next().map(str::to_string);

        Self {
            integrity_line,
            data_line,
            raw,
        }
    }

    /// The frame exactly as the device returned it.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Where frames come from. Reads are blocking; callers move them off the
/// async runtime.
pub trait FrameSource: Send + Sync + 'static {
    fn read_frame(&self) -> Result<RawFrame, SensorError>;

    fn describe(&self) -> String;
}

/// A sysfs `w1_slave` file.
#[derive(Debug, Clone)]
pub struct DeviceFile {
    path: PathBuf,
}

impl DeviceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for DeviceFile {
    fn read_frame(&self) -> Result<RawFrame, SensorError> {
        let bytes = std::fs::read(&self.path).map_err(|source| SensorError::Io {
            path: self.path.clone(),
            source,
        })?;

        Ok(RawFrame::parse(String::from_utf8_lossy(&bytes)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
