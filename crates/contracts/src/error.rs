//! Layered error definitions
//!
//! Categorized by source: config / trace / general

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Trace Errors =====
    /// Telemetry trace decode error
    #[error("trace decode error at line {line}: {message}")]
    TraceDecode { line: usize, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create trace decode error
    pub fn trace_decode(line: usize, message: impl Into<String>) -> Self {
        Self::TraceDecode {
            line,
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ContractError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Report the first offending field path
        let field = errors
            .errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "config".to_string());
        Self::ConfigValidation {
            field,
            message: errors.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ContractError::config_validation("slots.hysteresis_factor", "out of range");
        assert_eq!(
            err.to_string(),
            "config validation error at 'slots.hysteresis_factor': out of range"
        );
        let err = ContractError::trace_decode(7, "bad json");
        assert!(err.to_string().contains("line 7"));
    }
}
