//! # SA Engine
//!
//! Situational-awareness engine for multi-car racing telemetry.
//!
//! Responsible for:
//! - Per-car latches (off track, suspect surface, out lap, penalty)
//! - Checkpoint gate timing and wrapped truth gaps
//! - Gap fusion (filtered / truth / track / sticky)
//! - Ahead/behind slot assignment with hysteresis
//! - Race-relevance status classification
//!
//! ## Usage
//!
//! ```ignore
//! use sa_engine::{SaEngine, SaEngineConfig};
//!
//! let mut engine = SaEngine::try_new(SaEngineConfig::default())?;
//!
//! // Once per telemetry tick
//! engine.update(&frame);
//! engine.refresh_status(frame.not_relevant_gap_sec, None, "");
//!
//! for slot in engine.outputs().slots().filter(|s| s.is_bound()) {
//!     println!("{} {:+.2}s {}", slot.car_number, slot.gap_rel_sec, slot.status_short);
//! }
//! ```

mod car_state;
mod engine;
mod gap_filter;
mod gate;
mod latch;
mod sectors;
mod session;
mod slots;
mod sof;
mod status;
mod wrap;

pub use car_state::{CarState, Crossing};
pub use engine::SaEngine;
pub use gate::GateGapCache;
pub use latch::LatchState;
pub use session::{GateDecision, ResetCause, SessionKind};
pub use sof::strength_of_field;
pub use status::{describe, StatusText};
pub use wrap::{select_lap_time, wrap_gap};

// Re-export contracts types
pub use contracts::{
    Direction, GapSource, SaEngineConfig, SaLogSink, SaOutputs, Slot, StatusE, TelemetryFrame,
};
