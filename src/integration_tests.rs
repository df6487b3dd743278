#[cfg(test)]
mod integration_tests {
    use crate::audio::decoders::{save_wav, ToneSynthesizer};
    use crate::audio::sink::testing::{RecordingBackend, SinkProbe};
    use crate::audio::PlaybackEngine;
    use crate::cli::CommandSurface;
    use crate::config::EngineConfig;
    use crate::logging::AudioEventType;
    use crate::models::{AudioFormat, DecodeOrigin, PlaybackState};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    /// One second of 44.1 kHz 16-bit stereo
    const ONE_SECOND: usize = 176_400;

    fn test_config() -> EngineConfig {
        EngineConfig {
            poll_interval_ms: 1,
            ..EngineConfig::default()
        }
    }

    /// Write the 2 second 440 Hz test tone as a WAV file
    fn create_tone_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let tone = ToneSynthesizer::new(440.0, 2).render();
        save_wav(&path, &tone.format, &tone.data).unwrap();
        path
    }

    fn recording_engine(config: EngineConfig) -> (PlaybackEngine, RecordingBackend) {
        let backend = RecordingBackend::new();
        let mut engine = PlaybackEngine::new(config);
        engine.initialize(Arc::new(backend.clone())).unwrap();
        (engine, backend)
    }

    fn wait_until(what: &str, condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out waiting for {}", what);
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// The worker writes asynchronously after `play` returns
    fn wait_for_writes(backend: &RecordingBackend, writes: usize) {
        wait_until("device write", || SinkProbe::count(&backend.probe.writes) >= writes);
    }

    #[test]
    fn test_track_plays_to_the_end_and_rewinds() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_tone_file(temp_dir.path(), "tone.wav");
        let (mut engine, backend) = recording_engine(test_config());

        engine.load(&path).unwrap();
        engine.play().unwrap();
        assert!(engine.is_playing());
        wait_for_writes(&backend, 1);
        assert_eq!(backend.probe.last_write_len.load(Ordering::SeqCst), 2 * ONE_SECOND);

        backend.probe.drain();
        wait_until("natural finish", || engine.playback_state() == PlaybackState::Stopped);

        assert!(engine.position().is_zero());
        assert!(engine.is_file_loaded());
        assert_eq!(SinkProbe::count(&backend.probe.open_now), 0);
        assert_eq!(engine.logger().count_of(AudioEventType::PlaybackFinished), 1);
        assert_eq!(SinkProbe::count(&backend.probe.misuse), 0);

        // The same track starts again from the beginning
        engine.play().unwrap();
        wait_for_writes(&backend, 2);
        assert_eq!(backend.probe.last_write_start.load(Ordering::SeqCst), 0);
        engine.stop().unwrap();
    }

    #[test]
    fn test_stop_after_natural_finish_logs_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_tone_file(temp_dir.path(), "tone.wav");
        let (mut engine, backend) = recording_engine(test_config());

        engine.load(&path).unwrap();
        engine.play().unwrap();
        wait_for_writes(&backend, 1);
        backend.probe.drain();
        wait_until("natural finish", || engine.playback_state() == PlaybackState::Stopped);

        engine.stop().unwrap();
        engine.stop().unwrap();
        assert_eq!(engine.logger().count_of(AudioEventType::PlaybackStopped), 0);
        assert_eq!(engine.logger().count_of(AudioEventType::PlaybackFinished), 1);
        assert_eq!(SinkProbe::count(&backend.probe.closes), 1);
    }

    #[test]
    fn test_stop_then_play_resumes_from_reached_offset() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_tone_file(temp_dir.path(), "tone.wav");
        let (mut engine, backend) = recording_engine(EngineConfig {
            resume_after_stop: true,
            ..test_config()
        });

        engine.load(&path).unwrap();
        engine.play().unwrap();
        backend.probe.set_consumed(ONE_SECOND);
        wait_until("position update", || engine.position().offset == ONE_SECOND);

        engine.stop().unwrap();
        assert_eq!(engine.playback_state(), PlaybackState::Stopped);
        assert_eq!(engine.position().offset, ONE_SECOND);
        assert!((engine.current_position() - 1.0).abs() < 1e-9);

        engine.play().unwrap();
        wait_for_writes(&backend, 2);
        assert_eq!(backend.probe.last_write_start.load(Ordering::SeqCst), ONE_SECOND);
        assert_eq!(backend.probe.last_write_len.load(Ordering::SeqCst), ONE_SECOND);

        engine.stop().unwrap();
        assert_eq!(SinkProbe::count(&backend.probe.misuse), 0);
    }

    #[test]
    fn test_stop_rewinds_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_tone_file(temp_dir.path(), "tone.wav");
        let (mut engine, backend) = recording_engine(test_config());

        engine.load(&path).unwrap();
        engine.play().unwrap();
        backend.probe.set_consumed(ONE_SECOND / 2);
        wait_until("position update", || engine.position().offset > 0);

        engine.stop().unwrap();
        assert!(engine.position().is_zero());
        assert_eq!(engine.current_file(), Some(path.as_path()));
    }

    #[test]
    fn test_loading_missing_file_loads_nothing() {
        let (mut engine, backend) = recording_engine(test_config());

        assert!(engine.load("/no/such/dir/missing.wav").is_err());
        assert!(!engine.is_file_loaded());
        assert!(engine.current_file().is_none());
        assert!(engine.play().is_err());
        assert_eq!(SinkProbe::count(&backend.probe.opens), 0);
        assert_eq!(engine.logger().count_of(AudioEventType::DecodeError), 1);
    }

    #[test]
    fn test_repeated_play_never_opens_two_devices() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_tone_file(temp_dir.path(), "tone.wav");
        let (mut engine, backend) = recording_engine(test_config());
        engine.load(&path).unwrap();

        for _ in 0..5 {
            engine.play().unwrap();
            assert!(engine.is_playing());
        }

        assert_eq!(SinkProbe::count(&backend.probe.opens), 5);
        assert_eq!(SinkProbe::count(&backend.probe.max_open), 1);
        assert_eq!(SinkProbe::count(&backend.probe.open_now), 1);

        engine.stop().unwrap();
        assert_eq!(SinkProbe::count(&backend.probe.open_now), 0);
        assert_eq!(SinkProbe::count(&backend.probe.misuse), 0);
    }

    #[test]
    fn test_pause_toggles_device() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_tone_file(temp_dir.path(), "tone.wav");
        let (mut engine, backend) = recording_engine(test_config());
        engine.load(&path).unwrap();
        engine.play().unwrap();

        engine.pause().unwrap();
        assert!(engine.is_paused());
        wait_until("device pause", || backend.probe.is_paused());

        // Position does not move while paused
        let held = engine.position();
        backend.probe.set_consumed(ONE_SECOND);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(engine.position(), held);

        engine.pause().unwrap();
        assert!(engine.is_playing());
        wait_until("device resume", || !backend.probe.is_paused());
        assert!(SinkProbe::count(&backend.probe.resumes) >= 1);
        assert_eq!(SinkProbe::count(&backend.probe.opens), 1);

        engine.stop().unwrap();
        assert_eq!(SinkProbe::count(&backend.probe.misuse), 0);
    }

    #[test]
    fn test_stop_is_idempotent_and_stops_a_paused_session() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_tone_file(temp_dir.path(), "tone.wav");
        let (mut engine, backend) = recording_engine(test_config());
        engine.load(&path).unwrap();
        engine.play().unwrap();
        engine.pause().unwrap();
        wait_until("device pause", || backend.probe.is_paused());

        engine.stop().unwrap();
        engine.stop().unwrap();

        assert_eq!(engine.playback_state(), PlaybackState::Stopped);
        assert_eq!(SinkProbe::count(&backend.probe.open_now), 0);
        assert_eq!(SinkProbe::count(&backend.probe.closes), 1);
        assert_eq!(engine.logger().count_of(AudioEventType::PlaybackStopped), 1);
        assert!(matches!(engine.pause(), Err(crate::EngineError::NoActivePlayback)));
    }

    #[test]
    fn test_seek_while_playing_restarts_at_offset() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_tone_file(temp_dir.path(), "tone.wav");
        let (mut engine, backend) = recording_engine(test_config());
        engine.load(&path).unwrap();
        engine.play().unwrap();

        engine.seek(1.0).unwrap();
        assert!(engine.is_playing());
        assert_eq!(engine.current_position(), 1.0);
        assert_eq!(engine.position().offset, ONE_SECOND);
        wait_for_writes(&backend, 2);
        assert_eq!(backend.probe.last_write_start.load(Ordering::SeqCst), ONE_SECOND);
        assert_eq!(SinkProbe::count(&backend.probe.max_open), 1);

        // The position reported right after the seek is exactly the target
        thread::sleep(Duration::from_millis(10));
        assert_eq!(engine.current_position(), 1.0);

        engine.stop().unwrap();
        assert_eq!(SinkProbe::count(&backend.probe.misuse), 0);
    }

    #[test]
    fn test_seek_while_paused_applies_on_resume() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_tone_file(temp_dir.path(), "tone.wav");
        let (mut engine, backend) = recording_engine(test_config());
        engine.load(&path).unwrap();
        engine.play().unwrap();
        engine.pause().unwrap();

        engine.seek(0.5).unwrap();
        assert!(engine.is_paused());
        assert_eq!(engine.current_position(), 0.5);
        assert_eq!(SinkProbe::count(&backend.probe.opens), 1);

        engine.pause().unwrap();
        assert!(engine.is_playing());
        assert_eq!(SinkProbe::count(&backend.probe.opens), 2);
        wait_for_writes(&backend, 2);
        assert_eq!(backend.probe.last_write_start.load(Ordering::SeqCst), ONE_SECOND / 2);
        assert_eq!(SinkProbe::count(&backend.probe.max_open), 1);

        engine.stop().unwrap();
    }

    #[test]
    fn test_load_during_playback_detaches_old_worker() {
        let temp_dir = TempDir::new().unwrap();
        let first = create_tone_file(temp_dir.path(), "first.wav");
        let second = create_tone_file(temp_dir.path(), "second.wav");
        let (mut engine, backend) = recording_engine(test_config());

        engine.load(&first).unwrap();
        engine.play().unwrap();
        engine.load(&second).unwrap();

        // The old worker keeps its buffer but can no longer move the position
        backend.probe.set_consumed(ONE_SECOND);
        thread::sleep(Duration::from_millis(20));
        assert!(engine.position().is_zero());
        assert_eq!(engine.current_file(), Some(second.as_path()));

        engine.play().unwrap();
        wait_for_writes(&backend, 2);
        assert_eq!(backend.probe.last_write_start.load(Ordering::SeqCst), 0);
        assert_eq!(SinkProbe::count(&backend.probe.max_open), 1);
        engine.stop().unwrap();
    }

    #[test]
    fn test_unknown_extension_plays_synthetic_tone() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("track.ogg");
        std::fs::write(&path, b"OggS not really").unwrap();
        let (mut engine, backend) = recording_engine(test_config());

        engine.load(&path).unwrap();
        let status = engine.status();
        assert_eq!(status.origin, Some(DecodeOrigin::Synthetic));
        assert_eq!(status.format, Some(AudioFormat::new(44100, 2, 16)));
        assert_eq!(status.duration_secs, 2.0);

        engine.play().unwrap();
        assert_eq!(backend.probe.last_format(), Some(AudioFormat::new(44100, 2, 16)));
        engine.stop().unwrap();
    }

    #[test]
    fn test_hires_wav_seek_alignment() {
        let temp_dir = TempDir::new().unwrap();
        let format = AudioFormat::new(48000, 1, 24);
        let path = temp_dir.path().join("mono24.wav");
        save_wav(&path, &format, &vec![0u8; 3 * 48000]).unwrap();
        let (mut engine, backend) = recording_engine(test_config());

        engine.load(&path).unwrap();
        engine.seek(0.333333).unwrap();
        assert_eq!(engine.position().offset % 3, 0);

        engine.play().unwrap();
        assert_eq!(backend.probe.last_format(), Some(format));
        wait_for_writes(&backend, 1);
        assert_eq!(
            backend.probe.last_write_start.load(Ordering::SeqCst),
            engine.position().offset
        );
        engine.stop().unwrap();
    }

    #[test]
    fn test_null_backend_finishes_in_real_time() {
        let temp_dir = TempDir::new().unwrap();
        // 50 ms of 8 kHz 8-bit mono
        let format = AudioFormat::new(8000, 1, 8);
        let path = temp_dir.path().join("blip.wav");
        save_wav(&path, &format, &vec![128u8; 400]).unwrap();

        let mut engine = PlaybackEngine::new(EngineConfig {
            output_backend: "null".to_string(),
            ..test_config()
        });
        engine.initialize_from_config().unwrap();
        engine.load(&path).unwrap();
        engine.play().unwrap();

        wait_until("null device drain", || !engine.is_playing());
        assert_eq!(engine.playback_state(), PlaybackState::Stopped);
        assert!(engine.position().is_zero());
    }

    #[test]
    fn test_command_surface_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_tone_file(temp_dir.path(), "tone.wav");
        let (engine, backend) = recording_engine(test_config());
        let mut surface = CommandSurface::new(engine);

        assert!(!surface.play());
        assert!(surface.load(&path));
        assert!(surface.play());
        assert!(surface.pause());
        assert!(surface.is_paused());
        assert!(surface.seek(1.5));
        assert!(surface.pause());
        assert!(surface.is_playing());

        let copy = temp_dir.path().join("copy.wav");
        assert!(surface.save_file(&copy));
        assert_eq!(std::fs::read(&copy).unwrap(), std::fs::read(&path).unwrap());

        assert!(surface.stop());
        assert!(surface.stats().contains("SEEK_OPERATION=1"));
        assert_eq!(SinkProbe::count(&backend.probe.open_now), 0);
        assert_eq!(SinkProbe::count(&backend.probe.misuse), 0);
    }

    #[test]
    fn test_status_serializes_to_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_tone_file(temp_dir.path(), "tone.wav");
        let (mut engine, _backend) = recording_engine(test_config());
        engine.load(&path).unwrap();
        engine.seek(0.5).unwrap();

        let json = serde_json::to_value(engine.status()).unwrap();
        assert_eq!(json["state"], "Stopped");
        assert_eq!(json["origin"], "Parsed");
        assert_eq!(json["position_secs"], 0.5);
        assert_eq!(json["duration_secs"], 2.0);
        assert_eq!(json["format"]["sample_rate"], 44100);
        assert_eq!(json["format"]["block_align"], 4);
    }
}
