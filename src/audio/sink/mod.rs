pub mod cpal;
pub mod null;

#[cfg(test)]
pub mod testing;

pub use self::cpal::{CpalBackend, CpalSink};
pub use self::null::{NullBackend, NullSink};

use std::sync::Arc;

use crate::audio::OutputBackend;
use crate::config::EngineConfig;
use crate::error::DeviceError;

/// Registry keys accepted by [`create_backend`]
pub const BACKEND_NAMES: [&str; 2] = ["cpal", "null"];

/// Build the output backend registered under `name`
pub fn create_backend(name: &str, config: &EngineConfig) -> Result<Arc<dyn OutputBackend>, DeviceError> {
    match name.to_lowercase().as_str() {
        "cpal" => Ok(Arc::new(CpalBackend::new(config.preferred_device.clone()))),
        "null" => Ok(Arc::new(NullBackend::new())),
        _ => Err(DeviceError::UnknownBackend {
            name: name.to_string(),
        }),
    }
}
