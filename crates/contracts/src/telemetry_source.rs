//! TelemetrySource trait - telemetry frame source abstraction
//!
//! Decouples frame producers (trace replay, synthetic fields) from the
//! code that drives the engine.

use crate::TelemetryFrame;

/// Pull-based telemetry source
///
/// Each call yields the next tick of the session, `None` once exhausted.
pub trait TelemetrySource: Send {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// Produce the next frame
    fn next_frame(&mut self) -> Option<TelemetryFrame>;

    /// Nominal tick rate in Hz, if the source has one
    fn tick_hz(&self) -> Option<f64> {
        None
    }
}
