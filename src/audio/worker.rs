use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::audio::SinkHandle;
use crate::logging::AudioLogger;
use crate::models::{AudioFormat, PcmSlice, PlaybackPosition, PlaybackState};

/// Position plus the generation it belongs to. Load and Seek bump the
/// generation so a worker started earlier can no longer move the position.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct SessionCursor {
    pub position: PlaybackPosition,
    pub generation: u64,
}

/// Runtime state shared by the controller and its worker
#[derive(Debug)]
pub(super) struct SharedSession {
    state: Mutex<PlaybackState>,
    cursor: Mutex<SessionCursor>,
    stop_requested: AtomicBool,
    paused: AtomicBool,
}

impl SharedSession {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PlaybackState::Stopped),
            cursor: Mutex::new(SessionCursor::default()),
            stop_requested: AtomicBool::new(false),
            paused: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, PlaybackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn cursor(&self) -> MutexGuard<'_, SessionCursor> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_state(&self) -> PlaybackState {
        *self.state()
    }

    pub fn position(&self) -> PlaybackPosition {
        self.cursor().position
    }

    /// Replace the position and invalidate updates from running workers
    pub fn reposition(&self, position: PlaybackPosition) -> u64 {
        let mut cursor = self.cursor();
        cursor.position = position;
        cursor.generation += 1;
        cursor.generation
    }

    pub fn generation(&self) -> u64 {
        self.cursor().generation
    }

    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Clear both signals before a new worker starts
    pub fn clear_signals(&self) {
        self.stop_requested.store(false, Ordering::Release);
        self.paused.store(false, Ordering::Release);
    }

    fn advance(&self, generation: u64, position: PlaybackPosition) {
        let mut cursor = self.cursor();
        if cursor.generation == generation {
            cursor.position = position;
        }
    }
}

/// Background task draining one PCM range into one open sink
pub(super) struct PlaybackWorker {
    pub session: Arc<SharedSession>,
    pub sink: Box<dyn SinkHandle>,
    pub pcm: Arc<Vec<u8>>,
    pub format: AudioFormat,
    pub start: usize,
    pub generation: u64,
    pub poll_interval: Duration,
    pub logger: AudioLogger,
}

impl PlaybackWorker {
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("pcm-playback".to_string())
            .spawn(move || self.run())
    }

    fn run(mut self) {
        let started = Instant::now();
        let slice = PcmSlice::from_offset(Arc::clone(&self.pcm), self.start);
        log::debug!(
            "Worker streaming {} bytes from offset {}",
            slice.len(),
            slice.start()
        );

        if let Err(e) = self.sink.write(slice) {
            self.logger.log_device_error(&e.to_string());
            if let Err(e) = self.sink.reset() {
                log::warn!("Device reset after failed write also failed: {}", e);
            }
            self.sink.close();
            self.abandon();
            return;
        }

        let mut device_paused = false;
        let mut last_consumed = 0usize;

        loop {
            // Stop wins over pause so a paused session can always be stopped
            if self.session.stop_requested() {
                if let Err(e) = self.sink.reset() {
                    log::warn!("Failed to reset output device: {}", e);
                }
                self.sink.close();
                return;
            }

            let paused = self.session.is_paused();
            if paused != device_paused {
                if paused {
                    self.sink.pause();
                } else {
                    self.sink.resume();
                }
                device_paused = paused;
            }

            if paused {
                thread::sleep(self.poll_interval);
                continue;
            }

            let consumed = self.format.align_down(self.sink.consumed_bytes());
            if consumed > last_consumed {
                last_consumed = consumed;
                self.session.advance(
                    self.generation,
                    PlaybackPosition::from_offset(self.start + consumed, &self.format),
                );
            }

            if self.sink.is_drained() && self.finish(started) {
                return;
            }

            thread::sleep(self.poll_interval);
        }
    }

    /// Natural end of track. Returns false when a pause raced in, in which
    /// case the worker keeps polling.
    fn finish(&mut self, started: Instant) -> bool {
        let mut state = self.session.state();
        if self.session.is_paused() {
            return false;
        }

        self.sink.close();
        *state = PlaybackState::Stopped;
        self.session.set_paused(false);
        self.session.cursor().position = PlaybackPosition::zero();
        drop(state);

        self.logger.log_playback_finished(started.elapsed());
        true
    }

    /// Device failure: leave the session stopped unless a Stop is already
    /// taking care of it
    fn abandon(&self) {
        if self.session.stop_requested() {
            return;
        }
        let mut state = self.session.state();
        *state = PlaybackState::Stopped;
        self.session.set_paused(false);
    }
}
