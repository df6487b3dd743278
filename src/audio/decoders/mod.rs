pub mod flac;
pub mod tone;
pub mod wav;

pub use flac::{FlacDecoder, FrameCallbacks, PcmFrameCollector, StreamInfo};
pub use tone::ToneSynthesizer;
pub use wav::{save_wav, write_wav, WavDecoder};

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::audio::AudioDecoder;
use crate::config::EngineConfig;
use crate::error::DecodeError;
use crate::models::DecodedAudio;

/// Maps file extensions to decoding strategies
pub struct DecoderRegistry {
    decoders: HashMap<String, Arc<dyn AudioDecoder>>,
    fallback: Arc<dyn AudioDecoder>,
}

impl DecoderRegistry {
    /// An empty registry where every extension falls through to `fallback`
    pub fn new(fallback: Arc<dyn AudioDecoder>) -> Self {
        Self {
            decoders: HashMap::new(),
            fallback,
        }
    }

    pub fn with_defaults(config: &EngineConfig) -> Self {
        let mut registry = Self::new(Arc::new(ToneSynthesizer::new(
            config.synthetic_tone_hz,
            config.synthetic_duration_secs,
        )));

        let wav: Arc<dyn AudioDecoder> = Arc::new(WavDecoder::new());
        registry.register("wav", Arc::clone(&wav));
        registry.register("wave", wav);
        registry.register("flac", Arc::new(FlacDecoder::new()));

        registry
    }

    pub fn register(&mut self, extension: &str, decoder: Arc<dyn AudioDecoder>) {
        self.decoders.insert(extension.to_lowercase(), decoder);
    }

    /// Decoder for `path`, chosen by extension (case-insensitive)
    pub fn resolve(&self, path: &Path) -> Arc<dyn AudioDecoder> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.decoders.get(&ext.to_lowercase()))
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.decoders.keys().cloned().collect();
        extensions.sort();
        extensions
    }

    /// Check the file is present and non-empty, then decode it
    pub fn decode(&self, path: &Path) -> Result<DecodedAudio, DecodeError> {
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DecodeError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => DecodeError::Io(e),
        })?;

        if !metadata.is_file() {
            return Err(DecodeError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )));
        }

        if metadata.len() == 0 {
            return Err(DecodeError::EmptyFile {
                path: path.display().to_string(),
            });
        }

        let decoder = self.resolve(path);
        log::debug!("Decoding {} with the {} decoder", path.display(), decoder.name());
        decoder.decode(path)
    }
}
