//! # Ingestion
//!
//! Telemetry sources for offline use.
//!
//! Responsibilities:
//! - Replay recorded JSON-lines traces (`ReplaySource`)
//! - Generate a deterministic synthetic session (`MockField`)
//! - Stream frames from any `TelemetrySource` over a tokio channel
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{spawn_stream, ReplaySource, StreamConfig};
//!
//! let source = ReplaySource::open(Path::new("session.jsonl"))?;
//! let (pipeline, mut rx) = spawn_stream(Box::new(source), StreamConfig::new(64, Some(60.0)));
//! while let Some(frame) = rx.recv().await {
//!     engine.update(&frame);
//! }
//! ```

mod config;
mod error;
mod mock;
mod pipeline;
mod replay;

// Re-exports
pub use config::{IngestionMetrics, MetricsSnapshot, StreamConfig};
pub use contracts::{TelemetryFrame, TelemetrySource};
pub use error::{IngestionError, Result};
pub use mock::{MockField, MockFieldConfig};
pub use pipeline::{spawn_stream, IngestionPipeline};
pub use replay::{decode_line, write_trace, ReplaySource};
