//! Pipeline orchestration module.

mod board;
mod orchestrator;
mod stats;

pub use board::format_board;
pub use orchestrator::{Pipeline, PipelineConfig, SourceSpec};
pub use stats::PipelineStats;
