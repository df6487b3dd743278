pub mod decoders;
pub mod engine;
pub mod sink;
mod worker;

use std::path::Path;

use crate::error::{DecodeError, DeviceError};
use crate::models::{AudioFormat, DecodedAudio, PcmSlice};

pub use decoders::{DecoderRegistry, FlacDecoder, ToneSynthesizer, WavDecoder};
pub use engine::PlaybackEngine;
pub use sink::{create_backend, CpalBackend, NullBackend};

/// Turns a file on disk into a complete PCM buffer
pub trait AudioDecoder: Send + Sync {
    /// Short name used in logs and stats
    fn name(&self) -> &'static str;

    /// Decode the whole file. No partial buffer is returned on failure.
    fn decode(&self, path: &Path) -> Result<DecodedAudio, DecodeError>;
}

/// Factory for output sinks, one per playback attempt
pub trait OutputBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the backend can open a device at all on this machine
    fn is_available(&self) -> bool {
        true
    }

    /// Open a sink configured for `format`
    fn open(&self, format: &AudioFormat) -> Result<Box<dyn SinkHandle>, DeviceError>;
}

/// An open output device.
///
/// Write must happen after open; pause/resume are only meaningful before close.
/// Reset followed by close is always legal.
pub trait SinkHandle: Send {
    /// Hand the device the byte range to play
    fn write(&mut self, pcm: PcmSlice) -> Result<(), DeviceError>;

    fn pause(&mut self);

    fn resume(&mut self);

    /// Discard any audio the device has not played yet
    fn reset(&mut self) -> Result<(), DeviceError>;

    fn close(&mut self);

    /// Bytes of the last written range the device has played so far
    fn consumed_bytes(&self) -> usize;

    /// True once the whole written range has been played
    fn is_drained(&self) -> bool;
}
