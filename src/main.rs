use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use pcm_player::audio::PlaybackEngine;
use pcm_player::cli::{CliApp, CommandSurface, Commands, ParseError, StatusDisplay};
use pcm_player::config::ConfigManager;
use pcm_player::error::PlayerError;
use pcm_player::logging::{AudioLogger, LOG_LEVEL_ENV};
use pcm_player::models::{DecodeOrigin, PlaybackState};

/// Interactive front end around one playback engine
pub struct AppController {
    surface: CommandSurface,
    /// State seen after the last command or tick, used to spot a natural finish
    last_state: PlaybackState,
}

impl AppController {
    pub fn new(cli: &CliApp) -> Result<Self, PlayerError> {
        // Initialize logging first (default to 'warn' if unspecified)
        if std::env::var(LOG_LEVEL_ENV).is_err() {
            std::env::set_var(LOG_LEVEL_ENV, "warn");
        }
        if let Err(e) = AudioLogger::init() {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        let config_manager = match &cli.config {
            Some(path) => ConfigManager::with_path(CliApp::expand_path(&path.to_string_lossy())),
            None => ConfigManager::new()?,
        };
        info!("Configuration loaded from {}", config_manager.config_path().display());

        let mut config = config_manager.get_config().clone();
        cli.apply_overrides(&mut config);

        let mut engine = PlaybackEngine::new(config);
        engine.initialize_from_config()?;

        info!("Application controller initialized successfully");
        Ok(Self {
            surface: CommandSurface::new(engine),
            last_state: PlaybackState::Stopped,
        })
    }

    /// Load and play the file given on the command line
    pub fn start_with(&mut self, file: &Path) {
        self.execute_command(Commands::Play {
            path: Some(file.to_path_buf()),
        });
    }

    /// Execute a single command. Returns false when the player should exit.
    pub fn execute_command(&mut self, command: Commands) -> bool {
        let succeeded = match command {
            Commands::Play { path } => {
                let loaded = match path {
                    Some(path) => self.surface.load(&path),
                    None => true,
                };
                let playing = loaded && self.surface.play();
                if playing {
                    let status = self.surface.status();
                    println!("Playing: {}", status.display_name());
                    if status.origin == Some(DecodeOrigin::Synthetic) {
                        println!("Note: no decoder for this file type, playing a generated test tone");
                    }
                }
                playing
            }
            Commands::Load { path } => {
                let loaded = self.surface.load(&path);
                if loaded {
                    let status = self.surface.status();
                    let format = status
                        .format
                        .map(|f| f.format_description())
                        .unwrap_or_default();
                    println!("Loaded: {} ({})", status.display_name(), format);
                }
                loaded
            }
            Commands::Pause => {
                let toggled = self.surface.pause();
                if toggled {
                    if self.surface.is_paused() {
                        println!("OK: Paused");
                    } else {
                        println!("OK: Resumed");
                    }
                }
                toggled
            }
            Commands::Stop => {
                let stopped = self.surface.stop();
                if stopped {
                    println!("OK: Stopped");
                }
                stopped
            }
            Commands::Seek { seconds } => {
                let moved = self.surface.seek(seconds);
                if moved {
                    let target = Duration::try_from_secs_f64(seconds).unwrap_or_default();
                    println!("Seeked to: {}", CliApp::format_duration(target));
                }
                moved
            }
            Commands::Save { path } => {
                let saved = self.surface.save_file(&path);
                if saved {
                    println!("Saved: {}", path.display());
                }
                saved
            }
            Commands::Stats => {
                println!("{}", self.surface.stats());
                true
            }
            Commands::Status => {
                CliApp::display_status(&self.surface.status());
                true
            }
            Commands::Quit => return false,
        };

        if !succeeded {
            if let Some(error) = self.surface.take_last_error() {
                CliApp::display_error(&error);
            }
        }
        self.last_state = self.surface.playback_state();
        true
    }

    /// Announce a track that ran to its end since the last check
    fn poll_playback(&mut self) {
        let state = self.surface.playback_state();
        if self.last_state == PlaybackState::Playing && state == PlaybackState::Stopped {
            println!("\nPlayback finished");
            print!("> ");
            let _ = std::io::Write::flush(&mut std::io::stdout());
        }
        self.last_state = state;
    }

    /// Run interactive mode
    pub async fn run_interactive_mode(&mut self) -> Result<(), PlayerError> {
        println!("PCM Player v0.1.0");
        println!("Type 'help' for available commands, 'exit' or 'quit' to quit.");
        println!();

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let shutdown_flag_clone = Arc::clone(&shutdown_flag);
        if let Err(e) = ctrlc::set_handler(move || {
            println!("\nReceived interrupt signal. Shutting down...");
            shutdown_flag_clone.store(true, Ordering::Relaxed);
        }) {
            warn!("Could not install Ctrl-C handler: {}", e);
        }

        // Blocking stdin lives on its own thread; the loop polls it every 100ms
        let mut interval = tokio::time::interval(Duration::from_millis(100));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if tx.send(line.trim().to_string()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let mut awaiting_input = false;
        loop {
            if shutdown_flag.load(Ordering::Relaxed) {
                break;
            }

            if !awaiting_input {
                print!("> ");
                let _ = std::io::Write::flush(&mut std::io::stdout());
                awaiting_input = true;
            }

            tokio::select! {
                biased;

                line = rx.recv() => {
                    awaiting_input = false;
                    let Some(line) = line else {
                        println!();
                        break;
                    };
                    if line.is_empty() {
                        continue;
                    }

                    match CliApp::parse_command(&line) {
                        Ok(command) => {
                            if !self.execute_command(command) {
                                break;
                            }
                        }
                        Err(ParseError::HelpRequested) => CliApp::display_help(),
                        Err(e @ ParseError::UnknownCommand { .. }) => {
                            eprintln!("Error: {}", e);
                            CliApp::display_help();
                        }
                        Err(e) => {
                            eprintln!("Error: {}", e);
                            println!("Type 'help' for available commands.");
                        }
                    }
                }

                _ = interval.tick() => self.poll_playback(),
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Stop playback so the output device is released before exit
    pub fn shutdown(&mut self) {
        if !self.surface.stop() {
            if let Some(e) = self.surface.take_last_error() {
                eprintln!("Warning: Error stopping playback: {}", e);
            }
        }
        println!("Goodbye!");
    }
}

#[tokio::main]
async fn main() -> Result<(), PlayerError> {
    let cli = CliApp::parse();

    let mut app = match AppController::new(&cli) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            StatusDisplay::display_simple_error(&e);
            std::process::exit(1);
        }
    };

    if let Some(file) = &cli.file {
        app.start_with(file);
    }

    if let Err(e) = app.run_interactive_mode().await {
        StatusDisplay::display_error(&e);
        std::process::exit(1);
    }

    info!("Application shutdown complete");
    Ok(())
}
