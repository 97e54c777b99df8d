//! Error types for Cloak Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported message kind: {0}")]
    UnsupportedMessageKind(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Provider error: {0}")]
    Provider(String),

    // Pipeline stage failures
    #[error("PII detection failed: {0}")]
    Detection(String),

    #[error("Document extraction failed: {0}")]
    Extraction(String),

    #[error("Structured payload error: {0}")]
    StructuredPayload(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a pipeline may degrade gracefully instead of aborting
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Detection(_) | Error::Extraction(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
