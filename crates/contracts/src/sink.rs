//! SaLogSink trait - host-facing log output
//!
//! Defines the abstract interface for the optional logging sink injected
//! into the engine.

use std::sync::{Arc, Mutex};

/// Log severity for sink messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SinkLevel {
    Debug,
    Info,
    Warn,
}

/// Fire-and-forget log output
///
/// Implementations must return promptly and must not panic; the engine
/// calls this from inside its per-tick update.
pub trait SaLogSink: Send + Sync {
    /// Sink name (used for diagnostics)
    fn name(&self) -> &str;

    /// Emit a single message
    fn log(&self, level: SinkLevel, message: &str);
}

/// Sink that keeps messages in memory
///
/// Mostly useful in tests and for replay tooling that wants to print the
/// host messages afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogSink {
    messages: Arc<Mutex<Vec<(SinkLevel, String)>>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the messages logged so far
    pub fn messages(&self) -> Vec<(SinkLevel, String)> {
        self.messages
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl SaLogSink for MemoryLogSink {
    fn name(&self) -> &str {
        "memory"
    }

    fn log(&self, level: SinkLevel, message: &str) {
        // A poisoned lock only drops the message
        if let Ok(mut guard) = self.messages.lock() {
            guard.push((level, message.to_string()));
        }
    }
}
