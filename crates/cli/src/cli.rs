//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// SA Replay - drive the situational-awareness engine from recorded or synthetic telemetry
#[derive(Parser, Debug)]
#[command(
    name = "sa-replay",
    author,
    version,
    about = "Situational-awareness engine replay harness",
    long_about = "Replays a recorded telemetry trace (JSON lines) or a synthetic multi-car \n\
                  session through the situational-awareness engine and prints the ranked \n\
                  ahead/behind board, per-tick JSON outputs and a run summary."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SA_REPLAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SA_REPLAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay telemetry through the engine
    Run(RunArgs),

    /// Validate a tuning profile without running
    Validate(ValidateArgs),

    /// Display the effective tuning
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Recorded JSON-lines trace to replay
    #[arg(long, conflicts_with = "mock", env = "SA_REPLAY_TRACE")]
    pub trace: Option<PathBuf>,

    /// Generate a synthetic session with this many cars
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=64))]
    pub mock: Option<u16>,

    /// Seed of the synthetic session
    #[arg(long, default_value = "7")]
    pub seed: u64,

    /// Session type of the synthetic session
    #[arg(long, default_value = "Race")]
    pub session_type: String,

    /// Split the synthetic field into two classes
    #[arg(long)]
    pub multi_class: bool,

    /// Tuning profile (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "SA_REPLAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of ticks to run (0 = until the source ends; mock runs 3600)
    #[arg(long, default_value = "0", env = "SA_REPLAY_TICKS")]
    pub ticks: u64,

    /// Pace frames at this rate (omit to run as fast as possible)
    #[arg(long)]
    pub hz: Option<f64>,

    /// Print every tick's outputs as a JSON line instead of the board
    #[arg(long)]
    pub json: bool,

    /// Print the board every N ticks (0 = only at the end)
    #[arg(long, default_value = "60")]
    pub board_every: u64,

    /// Gap beyond which slots are flagged not relevant (overrides the trace)
    #[arg(long)]
    pub not_relevant_gap: Option<f64>,

    /// Channel buffer size between source and engine
    #[arg(long, default_value = "64", env = "SA_REPLAY_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "SA_REPLAY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Tuning profile to validate
    #[arg(short, long, default_value = "sa_tuning.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Tuning profile; defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON instead of TOML
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
