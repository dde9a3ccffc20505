use std::{io, path::PathBuf};

use thiserror::Error;

/// Which check a raw frame failed.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameDefect {
    /// The device returned fewer than two lines.
    MissingDataLine,
    /// The first line does not end in the `YES` marker.
    IntegrityFailed,
    /// The second line has no parseable `key=millidegrees` value.
    MalformedValue,
    /// Parsed fine but lies outside `[-128, 128)` °C.
    OutOfRange(f64),
}

impl std::fmt::Display for FrameDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDataLine => write!(f, "frame has no data line"),
            Self::IntegrityFailed => write!(f, "integrity marker is not YES"),
            Self::MalformedValue => write!(f, "data line has no integer millidegree value"),
            Self::OutOfRange(celsius) => write!(f, "{celsius} °C is outside [-128, 128)"),
        }
    }
}

/// A frame that was read but must not be stored.
#[derive(Debug, Clone, Error)]
#[error("invalid sensor frame ({reason}); raw data: {raw:?}")]
pub struct InvalidFrame {
    pub reason: FrameDefect,
    pub raw: String,
}

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("failed to read sensor device {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    InvalidFrame(#[from] InvalidFrame),
    #[error("sensor read worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
