//! `run` command implementation.

use anyhow::{Context, Result};
use ingestion::MockFieldConfig;
use tracing::{info, warn};

use super::load_engine_config;
use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig, SourceSpec};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = ?args.config, "Loading tuning");
    let engine = load_engine_config(args.config.as_deref())?;

    let pipeline_config = build_pipeline_config(args, engine);
    let pipeline = Pipeline::new(pipeline_config);

    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    tokio::select! {
        result = pipeline.run() => {
            let stats = result.context("Pipeline execution failed")?;
            info!(
                ticks = stats.frames_processed,
                valid_ticks = stats.valid_ticks,
                duration_secs = stats.duration.as_secs_f64(),
                tps = format!("{:.2}", stats.tps()),
                "Pipeline completed successfully"
            );
            if !args.json {
                stats.print_summary();
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("SA replay finished");
    Ok(())
}

fn build_pipeline_config(args: &RunArgs, engine: contracts::SaEngineConfig) -> PipelineConfig {
    let source = match (&args.trace, args.mock) {
        (Some(path), _) => Some(SourceSpec::Trace(path.clone())),
        (None, Some(cars)) => Some(SourceSpec::Mock(MockFieldConfig {
            cars: usize::from(cars),
            seed: args.seed,
            session_type: args.session_type.clone(),
            multi_class: args.multi_class,
            ..Default::default()
        })),
        (None, None) => None,
    };

    PipelineConfig {
        source,
        engine,
        max_ticks: (args.ticks > 0).then_some(args.ticks),
        tick_hz: args.hz,
        buffer_size: args.buffer_size,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
        json: args.json,
        board_every: args.board_every,
        not_relevant_gap_sec: args.not_relevant_gap,
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
