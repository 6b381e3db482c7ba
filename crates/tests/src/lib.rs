//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Tuning profiles flowing from disk into the engine
//! - Synthetic sessions streamed through ingestion into the engine
//! - Trace record/replay determinism

#[cfg(test)]
mod contract_tests {
    use contracts::{SaEngineConfig, SaOutputs, MAX_CARS, SLOTS_AHEAD, SLOTS_BEHIND};

    #[test]
    fn test_default_tuning_is_valid() {
        assert!(config_loader::ConfigLoader::validate(&SaEngineConfig::default()).is_ok());
    }

    #[test]
    fn test_output_shape() {
        let outputs = SaOutputs::default();
        assert_eq!(outputs.ahead.len(), SLOTS_AHEAD);
        assert_eq!(outputs.behind.len(), SLOTS_BEHIND);
        assert!(outputs.slots().all(|s| !s.is_bound()));
        assert!(MAX_CARS >= SLOTS_AHEAD + SLOTS_BEHIND + 1);
    }
}

#[cfg(test)]
mod config_tests {
    use std::io::Write;

    use contracts::{GapSource, TelemetryFrame};
    use sa_engine::SaEngine;

    fn frame(t: f64, pcts: &[f32]) -> TelemetryFrame {
        let n = pcts.len();
        TelemetryFrame {
            session_time_sec: t,
            session_state: 4,
            session_type_name: "Race".to_string(),
            player_car_idx: 0,
            lap_dist_pct: pcts.to_vec(),
            lap: vec![3; n],
            track_surface: vec![3; n],
            track_surface_material: vec![1; n],
            on_pit_road: vec![false; n],
            session_flags: vec![0; n],
            pace_flags: vec![0; n],
            player_best_lap_sec: 100.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_profile_from_disk_drives_engine() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[latch]\noff_track_debounce_ticks = 5").unwrap();
        let config = config_loader::ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.latch.off_track_debounce_ticks, 5);

        let mut engine = SaEngine::try_new(config).unwrap();
        engine.update(&frame(50.0, &[0.40, 0.45, 0.30]));
        engine.refresh_status(0.0, None, "");

        let ahead = &engine.outputs().ahead[0];
        assert_eq!(ahead.car_idx, Some(1));
        assert_eq!(ahead.gap_source, GapSource::Track);
        assert!((ahead.gap_rel_sec - 5.0).abs() < 1e-3, "got {}", ahead.gap_rel_sec);

        let behind = &engine.outputs().behind[0];
        assert_eq!(behind.car_idx, Some(2));
        assert!((behind.gap_rel_sec + 10.0).abs() < 1e-3, "got {}", behind.gap_rel_sec);
    }

    #[test]
    fn test_invalid_profile_rejected_before_engine() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"slots": {{"hysteresis_factor": 1.5}}}}"#).unwrap();
        assert!(config_loader::ConfigLoader::load_from_path(file.path()).is_err());
    }
}

#[cfg(test)]
mod e2e_tests {
    use contracts::{Direction, GapSource, StatusE, TelemetryFrame, TelemetrySource};
    use ingestion::{spawn_stream, MockField, MockFieldConfig, ReplaySource, StreamConfig};
    use observability::SaMetricsAggregator;
    use sa_engine::SaEngine;

    fn field(cars: usize, seed: u64) -> MockField {
        MockField::new(MockFieldConfig {
            cars,
            seed,
            ..Default::default()
        })
        .unwrap()
    }

    /// Synthetic session -> ingestion stream -> engine -> aggregator
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        let source = field(16, 11);
        let roster = source.roster();
        let mut engine = SaEngine::default();
        engine.set_driver_roster(&roster);
        engine.update_irating_sof(&roster.iter().map(|c| c.irating).collect::<Vec<_>>());

        let (mut pipeline, mut rx) = spawn_stream(
            Box::new(source),
            StreamConfig {
                max_frames: Some(1200),
                ..Default::default()
            },
        );

        let mut aggregator = SaMetricsAggregator::new();
        while let Some(frame) = rx.recv().await {
            engine.update(&frame);
            engine.refresh_status(frame.not_relevant_gap_sec, None, "");
            let outputs = engine.outputs();
            aggregator.update(outputs);

            let lap_time = outputs.debug.lap_time_used_sec;
            for slot in outputs.slots().filter(|s| s.gap_rel_sec.is_finite()) {
                match slot.direction {
                    Direction::Ahead => assert!(slot.gap_rel_sec >= 0.0),
                    Direction::Behind => assert!(slot.gap_rel_sec <= 0.0),
                    Direction::Player => {}
                }
                if lap_time.is_finite() && lap_time > 0.0 {
                    assert!(
                        slot.gap_rel_sec.abs() <= 0.5 * lap_time + 1e-6,
                        "gap {} exceeds half of {}",
                        slot.gap_rel_sec,
                        lap_time
                    );
                }
            }
        }
        assert_eq!(pipeline.join().await, 1200);

        let summary = aggregator.summary();
        assert_eq!(summary.total_ticks, 1200);
        assert!(summary.valid_ticks > 0);
        assert!(engine.outputs().irating_sof.is_some());
        assert!(engine.outputs().ahead[0].is_bound());
        assert!(!engine.outputs().ahead[0].driver_name.is_empty());
    }

    /// Recording a session and replaying it yields the same board
    #[test]
    fn test_trace_replay_is_deterministic() {
        let mut source = field(8, 5);
        let frames: Vec<TelemetryFrame> = (0..600).filter_map(|_| source.next_frame()).collect();

        let file = tempfile::NamedTempFile::new().unwrap();
        ingestion::write_trace(std::fs::File::create(file.path()).unwrap(), &frames).unwrap();

        let mut live = SaEngine::default();
        let mut replayed = SaEngine::default();
        let mut replay = ReplaySource::open(file.path()).unwrap();

        for frame in &frames {
            let recorded = replay.next_frame().unwrap();
            live.update(frame);
            live.refresh_status(0.0, None, "");
            replayed.update(&recorded);
            replayed.refresh_status(0.0, None, "");

            for (a, b) in live.outputs().slots().zip(replayed.outputs().slots()) {
                assert_eq!(a.car_idx, b.car_idx);
                assert_eq!(a.status, b.status);
                assert_eq!(a.gap_source, b.gap_source);
                assert_eq!(a.gap_rel_sec.is_finite(), b.gap_rel_sec.is_finite());
                if a.gap_rel_sec.is_finite() {
                    assert!((a.gap_rel_sec - b.gap_rel_sec).abs() < 1e-6);
                }
            }
        }
        assert!(replay.next_frame().is_none());
    }

    /// A new session type mid-stream discards gate history and gates statuses
    #[test]
    fn test_session_change_resets_bindings() {
        let mut source = field(10, 2);
        let mut engine = SaEngine::default();
        for _ in 0..120 {
            if let Some(frame) = source.next_frame() {
                engine.update(&frame);
            }
        }
        assert!(engine.outputs().slots().any(|s| s.is_bound()));

        let Some(mut frame) = source.next_frame() else {
            panic!("mock field ended");
        };
        frame.session_type_name = "Lone Qualify".to_string();
        engine.update(&frame);
        engine.refresh_status(0.0, None, "");

        let outputs = engine.outputs();
        assert_eq!(outputs.debug.session_resets, 1);
        assert_eq!(outputs.debug.session_gate, "off");
        for slot in outputs.slots().filter(|s| s.is_bound()) {
            assert_eq!(slot.status, StatusE::Unknown);
            assert_eq!(slot.status_reason, "gated");
            assert!(matches!(slot.gap_source, GapSource::Track | GapSource::Invalid));
        }
    }
}
