#[cfg(test)]
mod tests {
    use crate::cli::{CliApp, Commands, ParseError};
    use crate::config::EngineConfig;
    use clap::Parser;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_parse_command_play() {
        assert_eq!(CliApp::parse_command("play").unwrap(), Commands::Play { path: None });

        match CliApp::parse_command("play /tmp/my song.wav").unwrap() {
            Commands::Play { path } => assert_eq!(path, Some(PathBuf::from("/tmp/my song.wav"))),
            other => panic!("Expected Play command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_command_is_case_insensitive() {
        assert_eq!(CliApp::parse_command("PAUSE").unwrap(), Commands::Pause);
        assert_eq!(CliApp::parse_command("  Stop  ").unwrap(), Commands::Stop);

        // Only the command word is folded, never the path
        match CliApp::parse_command("LOAD /Music/Tone.WAV").unwrap() {
            Commands::Load { path } => assert_eq!(path, PathBuf::from("/Music/Tone.WAV")),
            other => panic!("Expected Load command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_command_aliases() {
        assert_eq!(CliApp::parse_command("toggle").unwrap(), Commands::Pause);
        assert_eq!(CliApp::parse_command("quit").unwrap(), Commands::Quit);
        assert_eq!(CliApp::parse_command("exit").unwrap(), Commands::Quit);
        assert_eq!(CliApp::parse_command("stats").unwrap(), Commands::Stats);
        assert_eq!(CliApp::parse_command("status").unwrap(), Commands::Status);
    }

    #[test]
    fn test_parse_command_seek() {
        assert_eq!(
            CliApp::parse_command("seek 90").unwrap(),
            Commands::Seek { seconds: 90.0 }
        );
        assert_eq!(
            CliApp::parse_command("seek 1:30").unwrap(),
            Commands::Seek { seconds: 90.0 }
        );
        assert_eq!(
            CliApp::parse_command("seek 0.5s").unwrap(),
            Commands::Seek { seconds: 0.5 }
        );

        assert!(matches!(
            CliApp::parse_command("seek"),
            Err(ParseError::MissingArgument { .. })
        ));
        assert!(matches!(
            CliApp::parse_command("seek soon"),
            Err(ParseError::InvalidTimeFormat { .. })
        ));

        // Too large for a Duration: reported, not a crash
        for huge in ["seek 1e30", "seek 99999999999999999999:00", "seek 999999999999999999:00"] {
            assert!(
                matches!(CliApp::parse_command(huge), Err(ParseError::InvalidTimeFormat { .. })),
                "'{}' should be rejected",
                huge
            );
        }
    }

    #[test]
    fn test_parse_command_save_and_load_need_path() {
        match CliApp::parse_command("save") {
            Err(ParseError::MissingArgument { command, argument }) => {
                assert_eq!(command, "save");
                assert_eq!(argument, "path");
            }
            other => panic!("Expected MissingArgument, got {:?}", other),
        }
        assert!(matches!(
            CliApp::parse_command("load"),
            Err(ParseError::MissingArgument { .. })
        ));
        assert_eq!(
            CliApp::parse_command("save out.wav").unwrap(),
            Commands::Save {
                path: PathBuf::from("out.wav")
            }
        );
    }

    #[test]
    fn test_parse_command_errors() {
        assert!(matches!(CliApp::parse_command(""), Err(ParseError::EmptyCommand)));
        assert!(matches!(CliApp::parse_command("   "), Err(ParseError::EmptyCommand)));
        assert!(matches!(CliApp::parse_command("help"), Err(ParseError::HelpRequested)));

        match CliApp::parse_command("Rewind") {
            Err(ParseError::UnknownCommand { command }) => assert_eq!(command, "rewind"),
            other => panic!("Expected UnknownCommand, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(CliApp::parse_time("0").unwrap(), Duration::ZERO);
        assert_eq!(CliApp::parse_time("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(CliApp::parse_time("2:05").unwrap(), Duration::from_secs(125));
        assert_eq!(
            CliApp::parse_time("0:01.5").unwrap(),
            Duration::from_millis(1500)
        );

        for input in ["", "-1", "1:60", "1:2:3", "abc", "inf", "NaN", "1e30", "1e30s"] {
            assert!(
                matches!(CliApp::parse_time(input), Err(ParseError::InvalidTimeFormat { .. })),
                "'{}' should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(CliApp::format_duration(Duration::ZERO), "00:00");
        assert_eq!(CliApp::format_duration(Duration::from_secs(65)), "01:05");
        assert_eq!(CliApp::format_duration(Duration::from_millis(3599_900)), "59:59");
    }

    #[test]
    fn test_parse_error_display() {
        let error = ParseError::MissingArgument {
            command: "seek".to_string(),
            argument: "position".to_string(),
        };
        assert_eq!(error.to_string(), "Missing argument for seek: position");

        let error = ParseError::InvalidTimeFormat {
            input: "soon".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid time format: soon");
    }

    #[test]
    fn test_command_line_flags_override_config() {
        let cli = CliApp::try_parse_from([
            "pcmplay",
            "tone.wav",
            "--backend",
            "null",
            "--poll-interval-ms",
            "25",
        ])
        .unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("tone.wav")));

        let mut config = EngineConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.output_backend, "null");
        assert_eq!(config.poll_interval_ms, 25);
    }

    #[test]
    fn test_command_line_rejects_unknown_backend() {
        assert!(CliApp::try_parse_from(["pcmplay", "--backend", "alsa"]).is_err());
    }

    #[test]
    fn test_no_flags_leave_config_untouched() {
        let cli = CliApp::try_parse_from(["pcmplay"]).unwrap();
        assert!(cli.file.is_none());

        let mut config = EngineConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.output_backend, EngineConfig::default().output_backend);
        assert_eq!(config.poll_interval_ms, EngineConfig::default().poll_interval_ms);
    }
}
