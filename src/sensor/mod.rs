pub mod discovery;
pub mod error;
pub mod frame;
pub mod validate;

use std::sync::Arc;

use crate::db::models::Reading;

pub use discovery::{discover_device, Discovery};
pub use error::{FrameDefect, InvalidFrame, SensorError};
pub use frame::{DeviceFile, FrameSource, RawFrame};
pub use validate::validate;

/// One read-and-validate cycle. The blocking device read runs on the
/// blocking pool; conversion happens after the read returns, so the
/// timestamp is the acceptance time.
pub async fn sample(source: Arc<dyn FrameSource>) -> Result<Reading, SensorError> {
    let frame = tokio::task::spawn_blocking(move || source.read_frame()).await??;
    Ok(validate(&frame)?)
}
