//! Error types for CLI operations.

use thiserror::Error;

/// Command-level failures
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Tuning profile rejected
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    /// Neither a trace nor a mock field was requested
    #[error("No telemetry source: pass --trace <file.jsonl> or --mock <cars>")]
    NoSource,
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}
