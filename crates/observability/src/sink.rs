//! Default host log sink backed by `tracing`.

use contracts::{SaLogSink, SinkLevel};

/// Forwards engine messages to `tracing` events under the `sa_host` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl SaLogSink for TracingLogSink {
    fn name(&self) -> &str {
        "tracing"
    }

    fn log(&self, level: SinkLevel, message: &str) {
        match level {
            SinkLevel::Debug => tracing::debug!(target: "sa_host", "{message}"),
            SinkLevel::Info => tracing::info!(target: "sa_host", "{message}"),
            SinkLevel::Warn => tracing::warn!(target: "sa_host", "{message}"),
        }
    }
}
