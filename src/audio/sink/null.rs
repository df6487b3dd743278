use std::time::{Duration, Instant};

use crate::audio::{OutputBackend, SinkHandle};
use crate::error::DeviceError;
use crate::models::{AudioFormat, PcmSlice};

/// Silent output that consumes audio at real-time speed
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

impl NullBackend {
    pub fn new() -> Self {
        Self
    }
}

impl OutputBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn open(&self, format: &AudioFormat) -> Result<Box<dyn SinkHandle>, DeviceError> {
        if format.block_align == 0 || format.sample_rate == 0 {
            return Err(DeviceError::OpenFailed(format!(
                "invalid format: {}",
                format.format_description()
            )));
        }
        Ok(Box::new(NullSink::new(*format)))
    }
}

#[derive(Debug)]
pub struct NullSink {
    format: AudioFormat,
    len: usize,
    started: Option<Instant>,
    paused_at: Option<Instant>,
    paused_total: Duration,
    closed: bool,
}

impl NullSink {
    fn new(format: AudioFormat) -> Self {
        Self {
            format,
            len: 0,
            started: None,
            paused_at: None,
            paused_total: Duration::ZERO,
            closed: false,
        }
    }

    fn played_for(&self) -> Duration {
        let Some(started) = self.started else {
            return Duration::ZERO;
        };
        let until = self.paused_at.unwrap_or_else(Instant::now);
        until
            .saturating_duration_since(started)
            .saturating_sub(self.paused_total)
    }
}

impl SinkHandle for NullSink {
    fn write(&mut self, pcm: PcmSlice) -> Result<(), DeviceError> {
        if self.closed {
            return Err(DeviceError::WriteFailed("device is closed".to_string()));
        }

        let now = Instant::now();
        self.len = pcm.len();
        self.started = Some(now);
        self.paused_total = Duration::ZERO;
        if self.paused_at.is_some() {
            self.paused_at = Some(now);
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
        }
    }

    fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += paused_at.elapsed();
        }
    }

    fn reset(&mut self) -> Result<(), DeviceError> {
        if self.closed {
            return Err(DeviceError::ResetFailed("device is closed".to_string()));
        }
        self.len = 0;
        self.started = None;
        self.paused_total = Duration::ZERO;
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn consumed_bytes(&self) -> usize {
        let bytes = self.played_for().as_secs_f64() * self.format.avg_bytes_per_sec() as f64;
        self.format.align_down(bytes as usize).min(self.len)
    }

    fn is_drained(&self) -> bool {
        self.started.is_some() && self.consumed_bytes() >= self.len
    }
}
