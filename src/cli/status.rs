use std::time::Duration;

use crate::error::{EngineError, ErrorSeverity, PlayerError};
use crate::models::{DecodeOrigin, PlaybackState, PlayerStatus};

/// Status display formatter for the CLI
pub struct StatusDisplay;

impl StatusDisplay {
    /// Display player status with file and format details
    pub fn display_full_status(status: &PlayerStatus) {
        println!("┌─ Player Status ─────────────────────────────────────────┐");

        if status.is_file_loaded() {
            println!("│ File: {}", Self::truncate(&status.display_name(), 50));
            if let Some(path) = &status.file {
                println!("│ Path: {}", Self::truncate(&path.display().to_string(), 50));
            }
            Self::display_playback_info(status);
            Self::display_technical_info(status);
        } else {
            println!("│ No file loaded");
            println!("│ Status: {}", Self::format_playback_state(status.state));
        }

        println!("└─────────────────────────────────────────────────────────┘");
    }

    /// One-line status
    pub fn display_compact_status(status: &PlayerStatus) {
        println!("{}", Self::compact_line(status));
    }

    pub fn compact_line(status: &PlayerStatus) -> String {
        if !status.is_file_loaded() {
            return format!("{} | No file loaded", status.state.as_str());
        }

        let format = status
            .format
            .map(|f| f.format_description())
            .unwrap_or_else(|| "Unknown format".to_string());

        format!(
            "{} | {} | {}/{} ({}%) | {}",
            status.state.as_str(),
            Self::truncate(&status.display_name(), 30),
            Self::format_duration(Self::secs(status.position_secs)),
            Self::format_duration(Self::secs(status.duration_secs)),
            (status.progress() * 100.0) as u8,
            format
        )
    }

    /// Display technical audio format information
    pub fn display_technical_info(status: &PlayerStatus) {
        let Some(format) = &status.format else {
            return;
        };

        println!("│");
        println!("│ ┌─ Technical Information ─────────────────────────────┐");
        println!("│ │ Sample Rate: {} Hz", format.sample_rate);
        println!("│ │ Bit Depth: {}-bit", format.bit_depth);
        println!(
            "│ │ Channels: {} ({})",
            format.channels,
            Self::channel_description(format.channels)
        );
        println!("│ │ Block Align: {} bytes", format.block_align);

        if format.is_high_resolution() {
            println!("│ │ Quality: High Resolution Audio");
        } else {
            println!("│ │ Quality: Standard Resolution");
        }

        if let Some(origin) = status.origin {
            println!("│ │ Source: {}", Self::origin_description(origin));
        }
        println!("│ └─────────────────────────────────────────────────────┘");
    }

    fn display_playback_info(status: &PlayerStatus) {
        println!("│");
        println!("│ Status: {}", Self::format_playback_state(status.state));

        let position = Self::secs(status.position_secs);
        let duration = Self::secs(status.duration_secs);
        println!(
            "│ Position: {} / {}",
            Self::format_duration(position),
            Self::format_duration(duration)
        );

        let progress = status.progress();
        println!(
            "│ Progress: [{}] {:.1}%",
            Self::create_progress_bar(progress, 40),
            progress * 100.0
        );
        println!(
            "│ Remaining: {}",
            Self::format_duration(duration.saturating_sub(position))
        );
    }

    /// Display error message with formatting and recovery suggestions
    pub fn display_error(error: &PlayerError) {
        let severity = error.severity();
        let severity_icon = match severity {
            ErrorSeverity::Info => "ℹ",
            ErrorSeverity::Warning => "⚠",
            ErrorSeverity::Error => "✗",
            ErrorSeverity::Critical => "🔥",
        };

        eprintln!(
            "┌─ {} {} ─────────────────────────────────────────────────┐",
            severity_icon,
            severity.as_str()
        );

        for line in Self::wrap_text(&error.user_message(), 55) {
            eprintln!("│ {}", line);
        }

        let suggestions = error.recovery_suggestions();
        if !suggestions.is_empty() {
            eprintln!("│");
            eprintln!("│ Suggestions:");
            for suggestion in suggestions.iter().take(3) {
                for line in Self::wrap_text(&format!("• {}", suggestion), 53) {
                    eprintln!("│   {}", line);
                }
            }
        }

        if let Some(context) = Self::error_context(error) {
            eprintln!("│");
            eprintln!("│ {}", context);
        }

        eprintln!("└─────────────────────────────────────────────────────────┘");
    }

    /// Extra hint for errors the user can act on from the prompt
    pub fn error_context(error: &PlayerError) -> Option<&'static str> {
        match error {
            PlayerError::Engine(EngineError::Decode(_)) => {
                Some("Supported: PCM WAV (8/16/24/32-bit) and FLAC")
            }
            PlayerError::Engine(EngineError::Device(_)) => {
                Some("Run with '--backend null' to play without sound output")
            }
            PlayerError::Engine(EngineError::Bounds { .. }) => {
                Some("Use 'status' to see the track length")
            }
            PlayerError::Config(_) => Some("Configuration will use default values"),
            _ => None,
        }
    }

    fn wrap_text(text: &str, width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current_line = String::new();

        for word in text.split_whitespace() {
            if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_line.len() + word.len() < width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current_line));
                current_line = word.to_string();
            }
        }

        if !current_line.is_empty() {
            lines.push(current_line);
        }
        lines
    }

    /// Display a simple error message for non-interactive contexts
    pub fn display_simple_error(error: &PlayerError) {
        eprintln!("[{}] {}", error.severity().as_str(), error.user_message());

        if let Some(suggestion) = error.recovery_suggestions().first() {
            eprintln!("Suggestion: {}", suggestion);
        }
    }

    /// Format duration as MM:SS or HH:MM:SS for longer tracks
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{:02}:{:02}", minutes, seconds)
        }
    }

    pub fn channel_description(channels: u16) -> &'static str {
        match channels {
            1 => "Mono",
            2 => "Stereo",
            4 => "Quad",
            6 => "5.1 Surround",
            8 => "7.1 Surround",
            _ => "Multi-channel",
        }
    }

    pub fn origin_description(origin: DecodeOrigin) -> &'static str {
        match origin {
            DecodeOrigin::Parsed => "WAV data (parsed)",
            DecodeOrigin::Streamed => "FLAC stream (decoded)",
            DecodeOrigin::Synthetic => "Generated test tone (file was not decoded)",
        }
    }

    /// Truncate string to fit display width
    pub fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len || max_len <= 3 {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len - 3).collect();
            format!("{}...", kept)
        }
    }

    pub fn create_progress_bar(progress: f64, width: usize) -> String {
        let filled = ((progress.clamp(0.0, 1.0) * width as f64) as usize).min(width);
        format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
    }

    pub fn format_playback_state(state: PlaybackState) -> String {
        match state {
            PlaybackState::Playing => "▶ Playing".to_string(),
            PlaybackState::Paused => "⏸ Paused".to_string(),
            PlaybackState::Stopped => "⏹ Stopped".to_string(),
        }
    }

    fn secs(seconds: f64) -> Duration {
        if seconds.is_finite() && seconds > 0.0 {
            Duration::from_secs_f64(seconds)
        } else {
            Duration::ZERO
        }
    }
}
