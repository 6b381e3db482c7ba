//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Uses the simulator session clock (seconds, f64) as the only clock
//! - Car indices address fixed arrays of [`MAX_CARS`] entries

mod error;
mod opponents;
mod outputs;
mod sa_engine_config;
mod sink;
mod telemetry;
mod telemetry_source;

pub use error::*;
pub use opponents::*;
pub use outputs::*;
pub use sa_engine_config::*;
pub use sink::*;
pub use telemetry::*;
pub use telemetry_source::TelemetrySource;
