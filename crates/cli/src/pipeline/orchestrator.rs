//! Pipeline orchestrator - wires a telemetry source into the engine.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{CarIdentity, SaEngineConfig, SaOutputs, TelemetryFrame, TelemetrySource};
use ingestion::{spawn_stream, MockField, MockFieldConfig, ReplaySource, StreamConfig};
use observability::{record_sa_metrics, TracingLogSink};
use sa_engine::SaEngine;
use tracing::{debug, info, warn};

use super::{format_board, PipelineStats};
use crate::error::CliError;

/// Ticks a synthetic session runs when no limit is given
const DEFAULT_MOCK_TICKS: u64 = 3600;

/// Where frames come from
#[derive(Debug, Clone)]
pub enum SourceSpec {
    /// Recorded JSON-lines trace
    Trace(PathBuf),
    /// Synthetic field
    Mock(MockFieldConfig),
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source: Option<SourceSpec>,

    /// Engine tuning
    pub engine: SaEngineConfig,

    /// Maximum number of ticks (None = until the source ends)
    pub max_ticks: Option<u64>,

    /// Pacing rate (None = as fast as possible)
    pub tick_hz: Option<f64>,

    /// Channel buffer size
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Print every tick as a JSON line
    pub json: bool,

    /// Print the board every N ticks (0 = only at the end)
    pub board_every: u64,

    /// Overrides the frame's not-relevant gap
    pub not_relevant_gap_sec: Option<f64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: None,
            engine: SaEngineConfig::default(),
            max_ticks: None,
            tick_hz: None,
            buffer_size: 64,
            metrics_port: None,
            json: false,
            board_every: 0,
            not_relevant_gap_sec: None,
        }
    }
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let (source, roster, max_ticks) = self.build_source()?;
        let mut engine = self.build_engine(&roster)?;

        info!(
            source = source.name(),
            roster = roster.len(),
            max_ticks = ?max_ticks,
            "Pipeline running"
        );

        let stream_config = StreamConfig {
            channel_capacity: self.config.buffer_size,
            tick_hz: self.config.tick_hz,
            max_frames: max_ticks,
        };
        let (mut ingestion, mut rx) = spawn_stream(source, stream_config);

        let mut stats = PipelineStats {
            roster_size: roster.len(),
            ..Default::default()
        };

        while let Some(frame) = rx.recv().await {
            let outputs = self.process_frame(&mut engine, &frame);
            stats.frames_processed += 1;
            if outputs.valid {
                stats.valid_ticks += 1;
            }
            stats.sa_metrics.update(outputs);
            self.emit(outputs, stats.frames_processed)?;
        }

        ingestion.stop();
        ingestion.join().await;
        stats.ingestion = ingestion.metrics().snapshot();
        stats.duration = start_time.elapsed();

        if !self.config.json {
            println!("{}", format_board(engine.outputs()));
        }

        info!(
            ticks = stats.frames_processed,
            duration_secs = stats.duration.as_secs_f64(),
            tps = format!("{:.2}", stats.tps()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }

    fn build_source(&self) -> Result<(Box<dyn TelemetrySource>, Vec<CarIdentity>, Option<u64>)> {
        match &self.config.source {
            Some(SourceSpec::Trace(path)) => {
                info!(path = %path.display(), "Running in REPLAY mode");
                let source = ReplaySource::open(path)
                    .with_context(|| format!("Failed to open trace {}", path.display()))?;
                Ok((Box::new(source), Vec::new(), self.config.max_ticks))
            }
            Some(SourceSpec::Mock(mock)) => {
                info!(
                    cars = mock.cars,
                    seed = mock.seed,
                    session = %mock.session_type,
                    "Running in MOCK mode"
                );
                let field = MockField::new(mock.clone()).context("Failed to build mock field")?;
                let roster = field.roster();
                let max_ticks = self.config.max_ticks.or(Some(DEFAULT_MOCK_TICKS));
                Ok((Box::new(field), roster, max_ticks))
            }
            None => Err(CliError::NoSource.into()),
        }
    }

    fn build_engine(&self, roster: &[CarIdentity]) -> Result<SaEngine> {
        let mut engine = SaEngine::try_new(self.config.engine.clone())
            .context("Engine tuning rejected")?
            .with_sink(Arc::new(TracingLogSink));

        if !roster.is_empty() {
            engine.set_driver_roster(roster);
            let ratings: Vec<i32> = roster.iter().map(|car| car.irating).collect();
            engine.update_irating_sof(&ratings);

            let ranks = class_ranks(roster);
            if ranks.len() > 1 {
                debug!(?ranks, "Class ranks assigned");
                engine.set_class_rank_map(ranks);
            }
        }
        Ok(engine)
    }

    fn process_frame<'a>(&self, engine: &'a mut SaEngine, frame: &TelemetryFrame) -> &'a SaOutputs {
        engine.update(frame);
        let not_relevant = self
            .config
            .not_relevant_gap_sec
            .unwrap_or(frame.not_relevant_gap_sec);
        engine.refresh_status(not_relevant, None, "");
        let outputs = engine.outputs();
        record_sa_metrics(outputs);
        outputs
    }

    fn emit(&self, outputs: &SaOutputs, tick: u64) -> Result<()> {
        if self.config.json {
            let line = serde_json::to_string(outputs).context("Failed to serialize outputs")?;
            println!("{}", line);
        } else if self.config.board_every > 0 && tick % self.config.board_every == 0 {
            println!("{}", format_board(outputs));
        } else if !outputs.valid && tick == 1 {
            warn!("First tick produced no valid outputs");
        }
        Ok(())
    }
}

/// Rank classes by first appearance in the roster
fn class_ranks(roster: &[CarIdentity]) -> HashMap<String, i32> {
    let mut ranks = HashMap::new();
    for car in roster.iter().filter(|c| !c.class_name.is_empty()) {
        let next = ranks.len() as i32 + 1;
        ranks.entry(car.class_name.clone()).or_insert(next);
    }
    ranks
}
