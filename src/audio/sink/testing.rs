//! Recording output backend for tests. The test decides how much of each
//! written range the "device" has played.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::audio::{OutputBackend, SinkHandle};
use crate::error::DeviceError;
use crate::models::{AudioFormat, PcmSlice};

#[derive(Debug, Default)]
pub struct SinkProbe {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub open_now: AtomicUsize,
    pub max_open: AtomicUsize,
    pub writes: AtomicUsize,
    pub pauses: AtomicUsize,
    pub resumes: AtomicUsize,
    pub resets: AtomicUsize,
    /// Calls made on a handle after it was closed
    pub misuse: AtomicUsize,
    pub paused_now: AtomicBool,
    pub last_write_start: AtomicUsize,
    pub last_write_len: AtomicUsize,
    consumed: AtomicUsize,
    drain_all: AtomicBool,
    fail_open: AtomicBool,
    fail_write: AtomicBool,
    last_format: Mutex<Option<AudioFormat>>,
}

impl SinkProbe {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Pretend the device has played `bytes` of the current range
    pub fn set_consumed(&self, bytes: usize) {
        self.consumed.store(bytes, Ordering::SeqCst);
    }

    /// Pretend the device has played everything written so far
    pub fn drain(&self) {
        self.drain_all.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_write.store(fail, Ordering::SeqCst);
    }

    pub fn last_format(&self) -> Option<AudioFormat> {
        *self.last_format.lock().unwrap()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    pub probe: Arc<SinkProbe>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn open(&self, format: &AudioFormat) -> Result<Box<dyn SinkHandle>, DeviceError> {
        let probe = &self.probe;
        if probe.fail_open.swap(false, Ordering::SeqCst) {
            return Err(DeviceError::OpenFailed("simulated open failure".to_string()));
        }

        probe.opens.fetch_add(1, Ordering::SeqCst);
        let now = probe.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        probe.max_open.fetch_max(now, Ordering::SeqCst);
        probe.consumed.store(0, Ordering::SeqCst);
        probe.drain_all.store(false, Ordering::SeqCst);
        probe.paused_now.store(false, Ordering::SeqCst);
        *probe.last_format.lock().unwrap() = Some(*format);

        Ok(Box::new(RecordingSink {
            probe: Arc::clone(probe),
            len: 0,
            closed: false,
        }))
    }
}

struct RecordingSink {
    probe: Arc<SinkProbe>,
    len: usize,
    closed: bool,
}

impl RecordingSink {
    fn check_open(&self) {
        if self.closed {
            self.probe.misuse.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl SinkHandle for RecordingSink {
    fn write(&mut self, pcm: PcmSlice) -> Result<(), DeviceError> {
        self.check_open();
        if self.probe.fail_write.load(Ordering::SeqCst) {
            return Err(DeviceError::WriteFailed("simulated write failure".to_string()));
        }

        self.probe.writes.fetch_add(1, Ordering::SeqCst);
        self.probe.last_write_start.store(pcm.start(), Ordering::SeqCst);
        self.probe.last_write_len.store(pcm.len(), Ordering::SeqCst);
        self.len = pcm.len();
        Ok(())
    }

    fn pause(&mut self) {
        self.check_open();
        self.probe.pauses.fetch_add(1, Ordering::SeqCst);
        self.probe.paused_now.store(true, Ordering::SeqCst);
    }

    fn resume(&mut self) {
        self.check_open();
        self.probe.resumes.fetch_add(1, Ordering::SeqCst);
        self.probe.paused_now.store(false, Ordering::SeqCst);
    }

    fn reset(&mut self) -> Result<(), DeviceError> {
        self.check_open();
        self.probe.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.probe.closes.fetch_add(1, Ordering::SeqCst);
            self.probe.open_now.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn consumed_bytes(&self) -> usize {
        if self.probe.drain_all.load(Ordering::SeqCst) {
            self.len
        } else {
            self.probe.consumed.load(Ordering::SeqCst).min(self.len)
        }
    }

    fn is_drained(&self) -> bool {
        self.probe.drain_all.load(Ordering::SeqCst)
    }
}

impl Drop for RecordingSink {
    fn drop(&mut self) {
        self.close();
    }
}
