//! Boolean command surface for front ends.
//!
//! Every command reports plain success or failure. The reason for the most
//! recent failure is logged at its severity and kept for display.

use std::path::Path;

use crate::audio::PlaybackEngine;
use crate::error::{EngineError, PlayerError};
use crate::models::{PlaybackState, PlayerStatus};

pub struct CommandSurface {
    engine: PlaybackEngine,
    last_error: Option<PlayerError>,
}

impl CommandSurface {
    pub fn new(engine: PlaybackEngine) -> Self {
        Self {
            engine,
            last_error: None,
        }
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let result = self.engine.load(path);
        self.record("load", result)
    }

    pub fn play(&mut self) -> bool {
        let result = self.engine.play();
        self.record("play", result)
    }

    pub fn pause(&mut self) -> bool {
        let result = self.engine.pause();
        self.record("pause", result)
    }

    pub fn stop(&mut self) -> bool {
        let result = self.engine.stop();
        self.record("stop", result)
    }

    pub fn seek(&mut self, seconds: f64) -> bool {
        let result = self.engine.seek(seconds);
        self.record("seek", result)
    }

    pub fn save_file<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let result = self.engine.save_file(path);
        self.record("save", result)
    }

    pub fn is_file_loaded(&self) -> bool {
        self.engine.is_file_loaded()
    }

    pub fn is_playing(&self) -> bool {
        self.engine.is_playing()
    }

    pub fn is_paused(&self) -> bool {
        self.engine.is_paused()
    }

    /// Current position in seconds
    pub fn current_position(&self) -> f64 {
        self.engine.current_position()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.engine.playback_state()
    }

    pub fn status(&self) -> PlayerStatus {
        self.engine.status()
    }

    pub fn stats(&self) -> String {
        self.engine.stats()
    }

    /// Reason the most recent command failed, cleared by the next success
    pub fn last_error(&self) -> Option<&PlayerError> {
        self.last_error.as_ref()
    }

    pub fn take_last_error(&mut self) -> Option<PlayerError> {
        self.last_error.take()
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PlaybackEngine {
        &mut self.engine
    }

    fn record(&mut self, command: &str, result: Result<(), EngineError>) -> bool {
        match result {
            Ok(()) => {
                self.last_error = None;
                true
            }
            Err(e) => {
                let error = PlayerError::from(e);
                log::log!(error.severity().log_level(), "{} failed: {}", command, error);
                self.last_error = Some(error);
                false
            }
        }
    }
}
