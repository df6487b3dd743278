use std::f64::consts::PI;
use std::path::Path;

use crate::audio::AudioDecoder;
use crate::error::DecodeError;
use crate::models::{AudioFormat, DecodeOrigin, DecodedAudio};

pub const TONE_SAMPLE_RATE: u32 = 44100;
pub const TONE_CHANNELS: u16 = 2;
pub const TONE_BIT_DEPTH: u16 = 16;

/// Stand-in decoder that renders a fixed stereo sine tone for formats
/// nothing else can decode
#[derive(Debug, Clone, Copy)]
pub struct ToneSynthesizer {
    frequency_hz: f64,
    duration_secs: u32,
}

impl ToneSynthesizer {
    pub fn new(frequency_hz: f64, duration_secs: u32) -> Self {
        Self {
            frequency_hz,
            duration_secs,
        }
    }

    pub fn format() -> AudioFormat {
        AudioFormat::new(TONE_SAMPLE_RATE, TONE_CHANNELS, TONE_BIT_DEPTH)
    }

    /// Render the tone; identical on every call
    pub fn render(&self) -> DecodedAudio {
        let format = Self::format();
        let frames = TONE_SAMPLE_RATE as usize * self.duration_secs as usize;
        let mut data = Vec::with_capacity(frames * format.block_align as usize);

        for i in 0..frames {
            let t = i as f64 / TONE_SAMPLE_RATE as f64;
            let sample = ((2.0 * PI * self.frequency_hz * t).sin() * 32767.0) as i16;
            let bytes = sample.to_le_bytes();
            for _ in 0..TONE_CHANNELS {
                data.extend_from_slice(&bytes);
            }
        }

        DecodedAudio::new(format, data, DecodeOrigin::Synthetic)
    }
}

impl Default for ToneSynthesizer {
    fn default() -> Self {
        Self::new(440.0, 2)
    }
}

impl AudioDecoder for ToneSynthesizer {
    fn name(&self) -> &'static str {
        "tone"
    }

    fn decode(&self, path: &Path) -> Result<DecodedAudio, DecodeError> {
        log::warn!(
            "No decoder for '{}'; substituting a {} Hz test tone",
            path.display(),
            self.frequency_hz
        );
        Ok(self.render())
    }
}
