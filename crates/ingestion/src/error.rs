//! Ingestion error types

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestionError {
    /// Trace file could not be opened or read
    #[error("failed to read trace {path}: {source}")]
    TraceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A trace line is not a valid telemetry frame
    #[error("trace decode error at line {line}: {message}")]
    TraceDecode { line: usize, message: String },

    /// Invalid synthetic field parameters
    #[error("invalid mock field: {message}")]
    InvalidMock { message: String },

    /// Downstream receiver dropped
    #[error("channel closed for source {source_name}")]
    ChannelClosed { source_name: String },
}

impl From<IngestionError> for ContractError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::TraceDecode { line, message } => Self::trace_decode(line, message),
            IngestionError::TraceIo { source, .. } => Self::Io(source),
            other => Self::Other(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestionError>;
