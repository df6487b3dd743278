use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crate::audio::decoders::{save_wav, DecoderRegistry};
use crate::audio::sink::create_backend;
use crate::audio::worker::{PlaybackWorker, SharedSession};
use crate::audio::OutputBackend;
use crate::config::EngineConfig;
use crate::error::{DeviceError, EngineError};
use crate::logging::AudioLogger;
use crate::models::{AudioFormat, DecodeOrigin, PlaybackPosition, PlaybackState, PlayerStatus};

/// The decoded buffer currently owned by the engine
#[derive(Debug, Clone)]
struct LoadedTrack {
    path: PathBuf,
    pcm: Arc<Vec<u8>>,
    format: AudioFormat,
    origin: DecodeOrigin,
}

impl LoadedTrack {
    fn duration_secs(&self) -> f64 {
        self.format.bytes_to_seconds(self.pcm.len())
    }
}

/// Single-track playback controller.
///
/// Owns the decoded buffer and the session state machine
/// (Stopped / Playing / Paused), and at most one background worker.
/// Commands run on the caller's thread; `play` and `stop` block until the
/// previous worker has exited, so two devices are never open at once.
pub struct PlaybackEngine {
    config: EngineConfig,
    backend: Option<Arc<dyn OutputBackend>>,
    decoders: DecoderRegistry,
    session: Arc<SharedSession>,
    worker: Option<JoinHandle<()>>,
    track: Option<LoadedTrack>,
    /// A seek landed while paused; resuming must restart the worker
    reposition_pending: bool,
    logger: AudioLogger,
}

impl PlaybackEngine {
    /// Create an engine that still needs [`initialize`](Self::initialize)
    pub fn new(config: EngineConfig) -> Self {
        let decoders = DecoderRegistry::with_defaults(&config);
        Self {
            config,
            backend: None,
            decoders,
            session: Arc::new(SharedSession::new()),
            worker: None,
            track: None,
            reposition_pending: false,
            logger: AudioLogger::new(),
        }
    }

    /// Install the output backend; commands are accepted afterwards
    pub fn initialize(&mut self, backend: Arc<dyn OutputBackend>) -> Result<(), EngineError> {
        if !backend.is_available() {
            self.logger
                .log_device_error(&format!("output backend '{}' is not available", backend.name()));
            return Err(EngineError::Device(DeviceError::NoDevice));
        }

        log::info!("Playback engine initialized with '{}' output", backend.name());
        self.backend = Some(backend);
        Ok(())
    }

    /// Initialize with the backend named by `output_backend` in the config
    pub fn initialize_from_config(&mut self) -> Result<(), EngineError> {
        let backend = create_backend(&self.config.output_backend, &self.config)?;
        self.initialize(backend)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn logger(&self) -> &AudioLogger {
        &self.logger
    }

    fn backend(&self) -> Result<Arc<dyn OutputBackend>, EngineError> {
        self.backend.clone().ok_or(EngineError::NotInitialized)
    }

    fn loaded_track(&self) -> Result<&LoadedTrack, EngineError> {
        match &self.track {
            Some(track) if !track.path.as_os_str().is_empty() => Ok(track),
            _ => Err(EngineError::NoFileLoaded),
        }
    }

    /// Decode `path` and make it the track for the next Play.
    ///
    /// On failure everything previously loaded stays as it was. A running
    /// worker keeps playing the buffer it started with.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), EngineError> {
        self.backend()?;
        let path = path.as_ref();
        let started = Instant::now();

        let decoded = self.decoders.decode(path).map_err(|e| {
            self.logger.log_decode_error(&path.display().to_string(), &e.to_string());
            e
        })?;

        let format_info = format!("{}, {}", decoded.format.format_description(), decoded.origin);
        self.track = Some(LoadedTrack {
            path: path.to_path_buf(),
            pcm: Arc::new(decoded.data),
            format: decoded.format,
            origin: decoded.origin,
        });
        self.session.reposition(PlaybackPosition::zero());
        self.reposition_pending = false;

        self.logger
            .log_track_loaded(&path.display().to_string(), &format_info, started.elapsed());
        Ok(())
    }

    /// Start a worker at the current position, replacing any live one
    pub fn play(&mut self) -> Result<(), EngineError> {
        let backend = self.backend()?;
        let track = self.loaded_track()?.clone();

        self.halt_worker();
        self.session.clear_signals();
        self.reposition_pending = false;

        let mut position = self.session.position();
        if position.offset >= track.pcm.len() {
            position = PlaybackPosition::zero();
        }
        let generation = self.session.reposition(position);

        let sink = backend.open(&track.format).map_err(|e| {
            self.logger.log_device_error(&e.to_string());
            EngineError::Device(e)
        })?;

        *self.session.state() = PlaybackState::Playing;

        let worker = PlaybackWorker {
            session: Arc::clone(&self.session),
            sink,
            pcm: Arc::clone(&track.pcm),
            format: track.format,
            start: position.offset,
            generation,
            poll_interval: self.config.poll_interval(),
            logger: self.logger.clone(),
        };

        match worker.spawn() {
            Ok(handle) => self.worker = Some(handle),
            Err(e) => {
                *self.session.state() = PlaybackState::Stopped;
                return Err(EngineError::Io(e));
            }
        }

        self.logger
            .log_playback_started(&track.path.display().to_string(), position.seconds);
        Ok(())
    }

    /// Toggle between Playing and Paused
    pub fn pause(&mut self) -> Result<(), EngineError> {
        self.backend()?;

        let state = self.session.current_state();
        match state {
            PlaybackState::Stopped => Err(EngineError::NoActivePlayback),
            PlaybackState::Paused if self.reposition_pending => {
                let resume_at = self.session.position().seconds;
                self.play()?;
                self.logger.log_playback_resumed(resume_at);
                Ok(())
            }
            PlaybackState::Playing | PlaybackState::Paused => {
                let mut state = self.session.state();
                // The worker may have finished between the two reads
                let next = match *state {
                    PlaybackState::Playing => PlaybackState::Paused,
                    PlaybackState::Paused => PlaybackState::Playing,
                    PlaybackState::Stopped => return Err(EngineError::NoActivePlayback),
                };
                self.session.set_paused(next == PlaybackState::Paused);
                *state = next;
                drop(state);

                let at = self.session.position().seconds;
                if next == PlaybackState::Paused {
                    self.logger.log_playback_paused(at);
                } else {
                    self.logger.log_playback_resumed(at);
                }
                Ok(())
            }
        }
    }

    /// Stop playback and wait for the worker to release the device.
    ///
    /// The decoded buffer, its format and the file identity stay loaded, so a
    /// later [`play`](Self::play) restarts the same track without a new
    /// [`load`](Self::load). Call `load` to switch tracks.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        self.backend()?;

        // A worker that already finished on its own still holds a join handle
        let was_active = self.session.current_state().is_active();
        self.halt_worker();
        self.session.set_paused(false);
        self.reposition_pending = false;

        if !self.config.resume_after_stop {
            self.session.reposition(PlaybackPosition::zero());
        }

        if was_active {
            self.logger.log_playback_stopped("stopped by caller");
        }
        Ok(())
    }

    /// Move the playback position to `seconds`.
    ///
    /// Stopped or paused sessions pick the position up on the next start.
    /// A playing session is paused and restarted from the new offset.
    pub fn seek(&mut self, seconds: f64) -> Result<(), EngineError> {
        self.backend()?;
        let track = self.loaded_track()?;

        let ceiling = self.config.seek_ceiling_secs;
        if !seconds.is_finite() || seconds < 0.0 || seconds > ceiling {
            return Err(EngineError::Validation { seconds, ceiling });
        }

        let candidate = (seconds * track.format.avg_bytes_per_sec() as f64).round() as usize;
        if candidate >= track.pcm.len() {
            return Err(EngineError::Bounds {
                seconds,
                duration: track.duration_secs(),
            });
        }

        let position = PlaybackPosition {
            offset: track.format.align_down(candidate),
            seconds,
        };
        let from = self.session.position().seconds;

        match self.session.current_state() {
            PlaybackState::Stopped => {
                self.session.reposition(position);
            }
            PlaybackState::Paused => {
                self.session.reposition(position);
                self.reposition_pending = true;
            }
            PlaybackState::Playing => {
                self.session.set_paused(true);
                self.session.reposition(position);
                self.play()?;
            }
        }

        self.logger.log_seek_operation(from, seconds);
        Ok(())
    }

    /// Write the loaded buffer to `path` as a PCM WAV file
    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EngineError> {
        self.backend()?;
        let track = self.loaded_track()?;

        save_wav(path.as_ref(), &track.format, &track.pcm)?;
        log::info!(
            "Saved {} bytes of PCM to {}",
            track.pcm.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Raise the stop flag and join the worker, if any
    fn halt_worker(&mut self) {
        self.session.request_stop();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("Playback worker panicked");
                self.logger.log_device_error("playback worker panicked");
            }
        }
        *self.session.state() = PlaybackState::Stopped;
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    pub fn is_file_loaded(&self) -> bool {
        self.loaded_track().is_ok()
    }

    pub fn is_playing(&self) -> bool {
        self.session.current_state() == PlaybackState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.session.current_state() == PlaybackState::Paused
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.session.current_state()
    }

    /// Position in seconds
    pub fn current_position(&self) -> f64 {
        self.session.position().seconds
    }

    pub fn position(&self) -> PlaybackPosition {
        self.session.position()
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.track.as_ref().map(|track| track.path.as_path())
    }

    pub fn format(&self) -> Option<AudioFormat> {
        self.track.as_ref().map(|track| track.format)
    }

    pub fn status(&self) -> PlayerStatus {
        let mut status = PlayerStatus::new();
        status.state = self.playback_state();
        status.position_secs = self.current_position();

        if let Some(track) = &self.track {
            status.file = Some(track.path.clone());
            status.duration_secs = track.duration_secs();
            status.format = Some(track.format);
            status.origin = Some(track.origin);
        }

        status
    }

    /// Human-readable engine report
    pub fn stats(&self) -> String {
        let backend = match &self.backend {
            Some(backend) => backend,
            None => return "Audio engine not initialized".to_string(),
        };

        let mut report = String::from("Playback engine statistics\n");
        report.push_str(&format!("  Output backend: {}\n", backend.name()));
        report.push_str(&format!("  State: {}\n", self.playback_state()));

        match &self.track {
            Some(track) => {
                report.push_str(&format!("  File: {}\n", track.path.display()));
                report.push_str(&format!("  Format: {}\n", track.format.format_description()));
                report.push_str(&format!(
                    "  Buffer: {} bytes ({:.2}s)\n",
                    track.pcm.len(),
                    track.duration_secs()
                ));
                let origin = match track.origin {
                    DecodeOrigin::Synthetic => "synthetic (generated test tone, file was not decoded)",
                    other => other.as_str(),
                };
                report.push_str(&format!("  Origin: {}\n", origin));
            }
            None => report.push_str("  File: none\n"),
        }

        report.push_str(&format!("  Position: {:.2}s\n", self.current_position()));

        let counts = self.logger.event_counts();
        if counts.is_empty() {
            report.push_str("  Events: none");
        } else {
            let events: Vec<String> = counts
                .iter()
                .map(|(event, count)| format!("{}={}", event.as_str(), count))
                .collect();
            report.push_str(&format!("  Events: {}", events.join(", ")));
        }

        report
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.halt_worker();
        }
    }
}
