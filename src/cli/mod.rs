use crate::config::EngineConfig;
use crate::error::PlayerError;
use crate::models::PlayerStatus;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub mod status;
pub mod surface;

pub use status::StatusDisplay;
pub use surface::CommandSurface;

/// PCM Player CLI
#[derive(Debug, Parser)]
#[command(name = "pcmplay")]
#[command(about = "Single-track PCM player for WAV and FLAC files")]
#[command(version = "0.1.0")]
pub struct CliApp {
    /// File to load and play on startup
    pub file: Option<PathBuf>,

    /// Path to an alternative config.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output backend to use for this run
    #[arg(long, value_parser = ["cpal", "null"])]
    pub backend: Option<String>,

    /// Worker polling interval in milliseconds
    #[arg(long, value_name = "N")]
    pub poll_interval_ms: Option<u64>,
}

/// Commands accepted by the interactive loop
#[derive(Debug, Clone, PartialEq)]
pub enum Commands {
    /// Play the loaded file, loading `path` first when given
    Play { path: Option<PathBuf> },
    /// Decode a file without starting playback
    Load { path: PathBuf },
    /// Toggle between playing and paused
    Pause,
    /// Stop playback
    Stop,
    /// Move the playback position
    Seek { seconds: f64 },
    /// Write the loaded PCM buffer as a WAV file
    Save { path: PathBuf },
    /// Show the engine report
    Stats,
    /// Show the player status box
    Status,
    Quit,
}

impl CliApp {
    /// Parse command line arguments
    pub fn parse() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Apply flags on top of the loaded configuration for this run only
    pub fn apply_overrides(&self, config: &mut EngineConfig) {
        if let Some(backend) = &self.backend {
            config.output_backend = backend.clone();
        }
        if let Some(interval) = self.poll_interval_ms {
            config.poll_interval_ms = interval;
        }
    }

    /// Expand tilde (~) in path to home directory
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            match dirs::home_dir() {
                Some(home_dir) => home_dir.join(rest),
                None => PathBuf::from(path),
            }
        } else if path == "~" {
            dirs::home_dir().unwrap_or_else(|| PathBuf::from(path))
        } else {
            PathBuf::from(path)
        }
    }

    /// Parse command from string (for interactive mode)
    pub fn parse_command(input: &str) -> Result<Commands, ParseError> {
        let args: Vec<&str> = input.split_whitespace().collect();
        if args.is_empty() {
            return Err(ParseError::EmptyCommand);
        }

        let command = args[0].to_lowercase();
        match command.as_str() {
            "play" => {
                if args.len() > 1 {
                    let path = Self::expand_path(&args[1..].join(" "));
                    Ok(Commands::Play { path: Some(path) })
                } else {
                    Ok(Commands::Play { path: None })
                }
            }
            "load" => Ok(Commands::Load {
                path: Self::path_argument(&args, "load")?,
            }),
            "pause" | "toggle" => Ok(Commands::Pause),
            "stop" => Ok(Commands::Stop),
            "seek" => {
                let Some(position) = args.get(1) else {
                    return Err(ParseError::MissingArgument {
                        command: "seek".to_string(),
                        argument: "position".to_string(),
                    });
                };
                let seconds = Self::parse_time(position)?.as_secs_f64();
                Ok(Commands::Seek { seconds })
            }
            "save" => Ok(Commands::Save {
                path: Self::path_argument(&args, "save")?,
            }),
            "stats" => Ok(Commands::Stats),
            "status" => Ok(Commands::Status),
            "quit" | "exit" => Ok(Commands::Quit),
            "help" => Err(ParseError::HelpRequested),
            _ => Err(ParseError::UnknownCommand { command }),
        }
    }

    fn path_argument(args: &[&str], command: &str) -> Result<PathBuf, ParseError> {
        if args.len() > 1 {
            Ok(Self::expand_path(&args[1..].join(" ")))
        } else {
            Err(ParseError::MissingArgument {
                command: command.to_string(),
                argument: "path".to_string(),
            })
        }
    }

    /// Display player status in a formatted way
    pub fn display_status(status: &PlayerStatus) {
        StatusDisplay::display_full_status(status);
    }

    /// Display error message with formatting
    pub fn display_error(error: &PlayerError) {
        StatusDisplay::display_error(error);
    }

    /// Display help information
    pub fn display_help() {
        println!("PCM Player - Available Commands:");
        println!();
        println!("Playback Control:");
        println!("  play [path]     - Start playback (optionally load a file first)");
        println!("  load <path>     - Load a file without playing it");
        println!("  pause, toggle   - Pause or resume playback");
        println!("  stop            - Stop playback");
        println!("  seek <time>     - Seek to position (e.g., '1:30', '90', '12.5s')");
        println!();
        println!("Information:");
        println!("  status          - Show current player status");
        println!("  stats           - Show engine statistics");
        println!();
        println!("Files:");
        println!("  save <path>     - Write the loaded audio as a WAV file");
        println!();
        println!("General:");
        println!("  help            - Show this help message");
        println!("  exit, quit      - Exit the player");
    }

    /// Parse time string to Duration. Accepts "1:30", "1:30.5", "90", "90s" and "12.5".
    pub fn parse_time(time_str: &str) -> Result<Duration, ParseError> {
        let trimmed = time_str.trim();
        let invalid = || ParseError::InvalidTimeFormat {
            input: time_str.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid());
        }

        let total_seconds = if let Some((minutes, seconds)) = trimmed.split_once(':') {
            let minutes: u64 = minutes.parse().map_err(|_| invalid())?;
            let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
            if !(0.0..60.0).contains(&seconds) {
                return Err(invalid());
            }
            minutes as f64 * 60.0 + seconds
        } else {
            let seconds: f64 = trimmed
                .strip_suffix('s')
                .unwrap_or(trimmed)
                .parse()
                .map_err(|_| invalid())?;
            if seconds < 0.0 {
                return Err(invalid());
            }
            seconds
        };

        // Rejects non-finite values and anything past Duration::MAX
        Duration::try_from_secs_f64(total_seconds).map_err(|_| invalid())
    }

    /// Format duration for display
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Command parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Empty command")]
    EmptyCommand,

    #[error("Unknown command: {command}")]
    UnknownCommand { command: String },

    #[error("Missing argument for {command}: {argument}")]
    MissingArgument { command: String, argument: String },

    #[error("Invalid time format: {input}")]
    InvalidTimeFormat { input: String },

    #[error("Help requested")]
    HelpRequested,
}

#[cfg(test)]
mod tests;
