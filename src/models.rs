use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// PCM layout of a decoded buffer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
    /// Bytes per frame (channels × bytes per sample)
    pub block_align: u16,
}

impl AudioFormat {
    /// Block alignment saturates at `u16::MAX`; use [`checked`](Self::checked) for untrusted headers
    pub fn new(sample_rate: u32, channels: u16, bit_depth: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bit_depth,
            block_align: channels.saturating_mul(bit_depth.div_ceil(8)),
        }
    }

    /// None when the frame size does not fit a 16-bit block alignment
    pub fn checked(sample_rate: u32, channels: u16, bit_depth: u16) -> Option<Self> {
        let block_align = channels.checked_mul(bit_depth.div_ceil(8))?;
        Some(Self {
            sample_rate,
            channels,
            bit_depth,
            block_align,
        })
    }

    pub fn bytes_per_sample(&self) -> u16 {
        self.bit_depth.div_ceil(8)
    }

    /// Average bytes consumed per second of playback
    pub fn avg_bytes_per_sec(&self) -> u64 {
        self.sample_rate as u64 * self.block_align as u64
    }

    /// Round a byte offset down to the start of its frame
    pub fn align_down(&self, offset: usize) -> usize {
        if self.block_align == 0 {
            return offset;
        }
        let align = self.block_align as usize;
        offset - offset % align
    }

    pub fn bytes_to_seconds(&self, bytes: usize) -> f64 {
        let rate = self.avg_bytes_per_sec();
        if rate == 0 {
            0.0
        } else {
            bytes as f64 / rate as f64
        }
    }

    pub fn duration_of(&self, bytes: usize) -> Duration {
        Duration::from_secs_f64(self.bytes_to_seconds(bytes))
    }

    /// Check if this is a high-resolution format (>= 24-bit or >= 96kHz)
    pub fn is_high_resolution(&self) -> bool {
        self.bit_depth >= 24 || self.sample_rate >= 96000
    }

    /// Get a human-readable format description
    pub fn format_description(&self) -> String {
        format!(
            "{}-bit/{} Hz - {} channel{}",
            self.bit_depth,
            self.sample_rate,
            self.channels,
            if self.channels == 1 { "" } else { "s" }
        )
    }
}

/// How a PCM buffer came to exist
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DecodeOrigin {
    /// Read directly out of an uncompressed container
    Parsed,
    /// Assembled frame by frame from a compressed stream
    Streamed,
    /// Generated tone standing in for a format with no decoder
    Synthetic,
}

impl DecodeOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeOrigin::Parsed => "parsed",
            DecodeOrigin::Streamed => "streamed",
            DecodeOrigin::Synthetic => "synthetic",
        }
    }
}

impl std::fmt::Display for DecodeOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a successful decode: interleaved PCM bytes plus their layout
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub format: AudioFormat,
    pub data: Vec<u8>,
    pub origin: DecodeOrigin,
}

impl DecodedAudio {
    pub fn new(format: AudioFormat, data: Vec<u8>, origin: DecodeOrigin) -> Self {
        Self { format, data, origin }
    }

    pub fn duration(&self) -> Duration {
        self.format.duration_of(self.data.len())
    }

    pub fn frames(&self) -> usize {
        match self.format.block_align {
            0 => 0,
            align => self.data.len() / align as usize,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.origin == DecodeOrigin::Synthetic
    }
}

/// Byte range of a shared PCM buffer handed to an output sink
#[derive(Debug, Clone)]
pub struct PcmSlice {
    data: Arc<Vec<u8>>,
    start: usize,
    end: usize,
}

impl PcmSlice {
    /// Build the range `[start, data.len())`, clamping `start` to the buffer
    pub fn from_offset(data: Arc<Vec<u8>>, start: usize) -> Self {
        let end = data.len();
        Self {
            data,
            start: start.min(end),
            end,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[self.start..self.end]
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Byte offset into the loaded buffer together with its time equivalent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlaybackPosition {
    pub offset: usize,
    pub seconds: f64,
}

impl PlaybackPosition {
    pub fn zero() -> Self {
        Self {
            offset: 0,
            seconds: 0.0,
        }
    }

    pub fn from_offset(offset: usize, format: &AudioFormat) -> Self {
        Self {
            offset,
            seconds: format.bytes_to_seconds(offset),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.offset == 0
    }
}

impl Default for PlaybackPosition {
    fn default() -> Self {
        Self::zero()
    }
}

/// Playback state enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    /// Get a human-readable string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        }
    }

    /// Playing or Paused, i.e. a worker owns an open device
    pub fn is_active(&self) -> bool {
        !matches!(self, PlaybackState::Stopped)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of the engine for front ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    pub file: Option<PathBuf>,
    pub position_secs: f64,
    pub duration_secs: f64,
    pub format: Option<AudioFormat>,
    pub origin: Option<DecodeOrigin>,
}

impl PlayerStatus {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Stopped,
            file: None,
            position_secs: 0.0,
            duration_secs: 0.0,
            format: None,
            origin: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, PlaybackState::Paused)
    }

    pub fn is_file_loaded(&self) -> bool {
        self.file.is_some()
    }

    /// Get progress as a fraction (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.duration_secs > 0.0 {
            (self.position_secs / self.duration_secs).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn display_name(&self) -> String {
        self.file
            .as_ref()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string()
    }
}

impl Default for PlayerStatus {
    fn default() -> Self {
        Self::new()
    }
}
