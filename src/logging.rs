use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use chrono::{DateTime, Utc};

/// Environment variable selecting the log level
pub const LOG_LEVEL_ENV: &str = "PCM_PLAYER_LOG_LEVEL";

/// Audio event for logging and debugging
#[derive(Debug, Clone)]
pub struct AudioEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: AudioEventType,
    pub duration: Option<Duration>,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEventType {
    TrackLoaded,
    PlaybackStarted,
    PlaybackPaused,
    PlaybackResumed,
    PlaybackStopped,
    PlaybackFinished,
    SeekOperation,
    DecodeError,
    DeviceError,
}

impl AudioEventType {
    pub const ALL: [AudioEventType; 9] = [
        AudioEventType::TrackLoaded,
        AudioEventType::PlaybackStarted,
        AudioEventType::PlaybackPaused,
        AudioEventType::PlaybackResumed,
        AudioEventType::PlaybackStopped,
        AudioEventType::PlaybackFinished,
        AudioEventType::SeekOperation,
        AudioEventType::DecodeError,
        AudioEventType::DeviceError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioEventType::TrackLoaded => "TRACK_LOADED",
            AudioEventType::PlaybackStarted => "PLAYBACK_STARTED",
            AudioEventType::PlaybackPaused => "PLAYBACK_PAUSED",
            AudioEventType::PlaybackResumed => "PLAYBACK_RESUMED",
            AudioEventType::PlaybackStopped => "PLAYBACK_STOPPED",
            AudioEventType::PlaybackFinished => "PLAYBACK_FINISHED",
            AudioEventType::SeekOperation => "SEEK_OPERATION",
            AudioEventType::DecodeError => "DECODE_ERROR",
            AudioEventType::DeviceError => "DEVICE_ERROR",
        }
    }
}

/// Logger for playback operations; keeps a bounded history next to the `log` output
#[derive(Clone)]
pub struct AudioLogger {
    events: Arc<Mutex<VecDeque<AudioEvent>>>,
    max_events: usize,
}

impl AudioLogger {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            max_events: max_events.max(1),
        }
    }

    /// Initialize logging system with appropriate log level
    pub fn init() -> Result<(), Box<dyn std::error::Error>> {
        let log_level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());

        let mut builder = env_logger::Builder::new();

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] [{}:{}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        });

        builder.filter_level(Self::parse_level(&log_level));
        builder.try_init()?;

        info!("Playback engine logging initialized with level: {}", log_level);
        Ok(())
    }

    fn parse_level(level: &str) -> log::LevelFilter {
        match level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            "off" => log::LevelFilter::Off,
            _ => log::LevelFilter::Info,
        }
    }

    fn events(&self) -> MutexGuard<'_, VecDeque<AudioEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log an audio event
    pub fn log_event(&self, event_type: AudioEventType, details: String, duration: Option<Duration>) {
        match event_type {
            AudioEventType::TrackLoaded
            | AudioEventType::PlaybackStarted
            | AudioEventType::PlaybackPaused
            | AudioEventType::PlaybackResumed
            | AudioEventType::PlaybackStopped
            | AudioEventType::PlaybackFinished => {
                info!("[{}] {}", event_type.as_str(), details);
            }
            AudioEventType::SeekOperation => {
                debug!("[{}] {}", event_type.as_str(), details);
            }
            AudioEventType::DecodeError => {
                warn!("[{}] {}", event_type.as_str(), details);
            }
            AudioEventType::DeviceError => {
                error!("[{}] {}", event_type.as_str(), details);
            }
        }

        let mut events = self.events();
        events.push_back(AudioEvent {
            timestamp: Utc::now(),
            event_type,
            duration,
            details,
        });

        while events.len() > self.max_events {
            events.pop_front();
        }
    }

    pub fn log_track_loaded(&self, path: &str, format_info: &str, load_time: Duration) {
        self.log_event(
            AudioEventType::TrackLoaded,
            format!("Loaded '{}' ({}) in {:.2}ms", path, format_info, load_time.as_secs_f64() * 1000.0),
            Some(load_time),
        );
    }

    pub fn log_playback_started(&self, path: &str, from_seconds: f64) {
        self.log_event(
            AudioEventType::PlaybackStarted,
            format!("Started playing '{}' from {:.2}s", path, from_seconds),
            None,
        );
    }

    pub fn log_playback_paused(&self, position_seconds: f64) {
        self.log_event(
            AudioEventType::PlaybackPaused,
            format!("Playback paused at position: {:.2}s", position_seconds),
            None,
        );
    }

    pub fn log_playback_resumed(&self, position_seconds: f64) {
        self.log_event(
            AudioEventType::PlaybackResumed,
            format!("Playback resumed at position: {:.2}s", position_seconds),
            None,
        );
    }

    pub fn log_playback_stopped(&self, reason: &str) {
        self.log_event(
            AudioEventType::PlaybackStopped,
            format!("Playback stopped: {}", reason),
            None,
        );
    }

    pub fn log_playback_finished(&self, played: Duration) {
        self.log_event(
            AudioEventType::PlaybackFinished,
            format!("Playback finished after {:.2}s", played.as_secs_f64()),
            Some(played),
        );
    }

    pub fn log_seek_operation(&self, from_seconds: f64, to_seconds: f64) {
        self.log_event(
            AudioEventType::SeekOperation,
            format!("Seek from {:.2}s to {:.2}s", from_seconds, to_seconds),
            None,
        );
    }

    pub fn log_decode_error(&self, file_path: &str, error: &str) {
        self.log_event(
            AudioEventType::DecodeError,
            format!("Decode error for '{}': {}", file_path, error),
            None,
        );
    }

    pub fn log_device_error(&self, error: &str) {
        self.log_event(
            AudioEventType::DeviceError,
            format!("Device error: {}", error),
            None,
        );
    }

    /// Get recent events for debugging
    pub fn get_recent_events(&self, count: usize) -> Vec<AudioEvent> {
        let events = self.events();
        let skip = events.len().saturating_sub(count);
        events.iter().skip(skip).cloned().collect()
    }

    pub fn count_of(&self, event_type: AudioEventType) -> usize {
        self.events()
            .iter()
            .filter(|event| event.event_type == event_type)
            .count()
    }

    /// Per-type event counts, omitting types that never occurred
    pub fn event_counts(&self) -> Vec<(AudioEventType, usize)> {
        AudioEventType::ALL
            .iter()
            .map(|event_type| (*event_type, self.count_of(*event_type)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    pub fn clear_events(&self) {
        self.events().clear();
    }
}

impl Default for AudioLogger {
    fn default() -> Self {
        Self::new()
    }
}
