use thiserror::Error;

/// Main player error type
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("CLI parse error: {0}")]
    Parse(#[from] crate::cli::ParseError),
}

impl PlayerError {
    /// Get user-friendly error message with suggested solutions
    pub fn user_message(&self) -> String {
        match self {
            PlayerError::Engine(err) => err.user_message(),
            PlayerError::File(err) => format!("File system error: {}", err),
            PlayerError::Config(err) => err.user_message(),
            PlayerError::Parse(err) => format!("Command error: {}", err),
        }
    }

    /// Get suggested recovery actions for the error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            PlayerError::Engine(err) => err.recovery_suggestions(),
            PlayerError::File(_) => vec!["Try the operation again".to_string()],
            PlayerError::Config(err) => err.recovery_suggestions(),
            PlayerError::Parse(_) => vec!["Type 'help' to see available commands".to_string()],
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PlayerError::Engine(err) => err.severity(),
            PlayerError::File(_) => ErrorSeverity::Error,
            PlayerError::Config(_) => ErrorSeverity::Warning,
            PlayerError::Parse(_) => ErrorSeverity::Info,
        }
    }

    /// Whether the player can keep running after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            PlayerError::Engine(err) => err.is_recoverable(),
            PlayerError::File(_) | PlayerError::Config(_) | PlayerError::Parse(_) => true,
        }
    }
}

/// Error severity levels for logging and user feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }

    pub fn log_level(&self) -> log::Level {
        match self {
            ErrorSeverity::Info => log::Level::Info,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error => log::Level::Error,
            ErrorSeverity::Critical => log::Level::Error,
        }
    }
}

/// Errors reported by the playback controller's commands
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Audio engine not initialized")]
    NotInitialized,

    #[error("No file loaded")]
    NoFileLoaded,

    #[error("No active playback")]
    NoActivePlayback,

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Invalid seek target {seconds}s: must be between 0 and {ceiling}s")]
    Validation { seconds: f64, ceiling: f64 },

    #[error("Seek target {seconds:.2}s is beyond the loaded duration {duration:.2}s")]
    Bounds { seconds: f64, duration: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn user_message(&self) -> String {
        match self {
            EngineError::NotInitialized => {
                "The audio engine has not been set up yet".to_string()
            }
            EngineError::NoFileLoaded => "No audio file is loaded - load one first".to_string(),
            EngineError::NoActivePlayback => "Nothing is playing right now".to_string(),
            EngineError::Decode(err) => err.user_message(),
            EngineError::Device(err) => err.user_message(),
            EngineError::Validation { seconds, ceiling } => {
                format!("Cannot seek to {}s - use a value between 0 and {}s", seconds, ceiling)
            }
            EngineError::Bounds { seconds, duration } => {
                format!("Cannot seek to {:.1}s - track is only {:.1}s long", seconds, duration)
            }
            EngineError::Io(err) => format!("Cannot access file: {}", err),
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            EngineError::NotInitialized => vec![
                "Restart the application".to_string(),
                "Check that an output backend is available".to_string(),
            ],
            EngineError::NoFileLoaded => vec![
                "Use 'load <file>' or 'play <file>' first".to_string(),
            ],
            EngineError::NoActivePlayback => vec![
                "Use 'play' to start playback".to_string(),
            ],
            EngineError::Decode(err) => err.recovery_suggestions(),
            EngineError::Device(err) => err.recovery_suggestions(),
            EngineError::Validation { ceiling, .. } => vec![
                format!("Use a position between 0 and {} seconds", ceiling),
            ],
            EngineError::Bounds { duration, .. } => vec![
                format!("Use a position between 0 and {:.1} seconds", duration),
                "Try seeking to an earlier position in the track".to_string(),
            ],
            EngineError::Io(_) => vec![
                "Check the path and file permissions".to_string(),
                "Ensure the disk is not full".to_string(),
            ],
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            EngineError::NotInitialized => false,
            EngineError::NoFileLoaded => true,
            EngineError::NoActivePlayback => true,
            EngineError::Decode(err) => err.is_recoverable(),
            EngineError::Device(err) => err.is_recoverable(),
            EngineError::Validation { .. } => false,
            EngineError::Bounds { .. } => false,
            EngineError::Io(_) => true,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EngineError::NotInitialized => ErrorSeverity::Critical,
            EngineError::NoFileLoaded | EngineError::NoActivePlayback => ErrorSeverity::Info,
            EngineError::Validation { .. } | EngineError::Bounds { .. } => ErrorSeverity::Warning,
            EngineError::Decode(DecodeError::FileNotFound { .. }) => ErrorSeverity::Warning,
            EngineError::Decode(_) => ErrorSeverity::Error,
            EngineError::Device(_) => ErrorSeverity::Error,
            EngineError::Io(_) => ErrorSeverity::Error,
        }
    }
}

/// Audio decoding errors
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("File is empty: {path}")]
    EmptyFile { path: String },

    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("No data chunk found before end of file")]
    MissingDataChunk,

    #[error("Stream decode failed: {0}")]
    StreamDecodeFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    pub fn user_message(&self) -> String {
        match self {
            DecodeError::FileNotFound { path } => format!("Cannot find audio file: {}", path),
            DecodeError::EmptyFile { path } => format!("Audio file '{}' is empty", path),
            DecodeError::MalformedHeader(msg) => {
                format!("Audio file header is damaged or not what the extension claims: {}", msg)
            }
            DecodeError::UnsupportedEncoding(msg) => {
                format!("Audio encoding is not supported: {}", msg)
            }
            DecodeError::MissingDataChunk => {
                "Audio file contains no sample data".to_string()
            }
            DecodeError::StreamDecodeFailure(msg) => {
                format!("Failed to decode audio stream: {}", msg)
            }
            DecodeError::Io(err) => format!("Cannot read audio file: {}", err),
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            DecodeError::FileNotFound { .. } => vec![
                "Check that the file path is correct".to_string(),
                "Try using absolute path instead of relative path".to_string(),
            ],
            DecodeError::EmptyFile { .. } => vec![
                "Check if the file is completely downloaded".to_string(),
            ],
            DecodeError::MalformedHeader(_) | DecodeError::MissingDataChunk => vec![
                "Try re-downloading or re-copying the file".to_string(),
                "Check if the file extension matches the actual format".to_string(),
            ],
            DecodeError::UnsupportedEncoding(_) => vec![
                "Only uncompressed PCM WAV files are supported".to_string(),
                "Convert the file to 16-bit or 24-bit PCM".to_string(),
            ],
            DecodeError::StreamDecodeFailure(_) => vec![
                "Verify the file is not corrupted".to_string(),
                "Try re-encoding the file".to_string(),
            ],
            DecodeError::Io(_) => vec![
                "Check file permissions".to_string(),
                "Ensure the file is not locked by another application".to_string(),
            ],
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            DecodeError::FileNotFound { .. } => false,
            DecodeError::EmptyFile { .. } => false,
            DecodeError::MalformedHeader(_) => false,
            DecodeError::UnsupportedEncoding(_) => false,
            DecodeError::MissingDataChunk => false,
            DecodeError::StreamDecodeFailure(_) => false,
            DecodeError::Io(_) => true, // Can retry
        }
    }
}

/// Output sink errors
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("No output device available")]
    NoDevice,

    #[error("Output device not found: {device}")]
    DeviceNotFound { device: String },

    #[error("Failed to open output device: {0}")]
    OpenFailed(String),

    #[error("Failed to write to output device: {0}")]
    WriteFailed(String),

    #[error("Failed to reset output device: {0}")]
    ResetFailed(String),

    #[error("Unknown output backend: {name}")]
    UnknownBackend { name: String },
}

impl DeviceError {
    pub fn user_message(&self) -> String {
        match self {
            DeviceError::NoDevice => "No audio output device is available".to_string(),
            DeviceError::DeviceNotFound { device } => {
                format!("Audio device '{}' is not available or has been disconnected", device)
            }
            DeviceError::OpenFailed(msg) => format!("Could not open audio output: {}", msg),
            DeviceError::WriteFailed(msg) => format!("Audio playback interrupted: {}", msg),
            DeviceError::ResetFailed(msg) => format!("Could not reset audio output: {}", msg),
            DeviceError::UnknownBackend { name } => {
                format!("Output backend '{}' does not exist", name)
            }
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            DeviceError::NoDevice | DeviceError::DeviceNotFound { .. } => vec![
                "Check that your audio device is connected and powered on".to_string(),
                "Use '--backend null' to run without an audio device".to_string(),
            ],
            DeviceError::OpenFailed(_) => vec![
                "Check that no other applications are using exclusive audio access".to_string(),
                "The device may not support this sample rate or channel count".to_string(),
            ],
            DeviceError::WriteFailed(_) | DeviceError::ResetFailed(_) => vec![
                "Restart the audio stream with 'stop' then 'play'".to_string(),
            ],
            DeviceError::UnknownBackend { .. } => vec![format!(
                "Available backends: {}",
                crate::audio::sink::BACKEND_NAMES.join(", ")
            )],
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            DeviceError::NoDevice => false,
            DeviceError::DeviceNotFound { .. } => true,
            DeviceError::OpenFailed(_) => true,
            DeviceError::WriteFailed(_) => true,
            DeviceError::ResetFailed(_) => true,
            DeviceError::UnknownBackend { .. } => false,
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    ConfigDirNotFound,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] toml::de::Error),
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::ConfigDirNotFound => {
                "Cannot find or create configuration directory".to_string()
            }
            ConfigError::IoError(err) => {
                format!("Cannot access configuration file: {}", err)
            }
            ConfigError::SerializationError(_) => {
                "Failed to save configuration settings".to_string()
            }
            ConfigError::DeserializationError(_) => {
                "Configuration file is corrupted or has invalid format".to_string()
            }
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ConfigError::ConfigDirNotFound => vec![
                "Check that you have write permissions to your home directory".to_string(),
                "Try creating the directory manually: ~/.config/pcm-player/".to_string(),
            ],
            ConfigError::IoError(_) => vec![
                "Check file permissions for the configuration directory".to_string(),
                "Try deleting and recreating the configuration file".to_string(),
            ],
            ConfigError::SerializationError(_) => vec![
                "Configuration will use default values".to_string(),
            ],
            ConfigError::DeserializationError(_) => vec![
                "Delete the configuration file to reset to defaults".to_string(),
                "Check the configuration file format manually".to_string(),
            ],
        }
    }
}
