//! Error types for PII redaction

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PiiError {
    #[error("Rule name must not be empty")]
    EmptyRuleName,

    #[error("Duplicate rule name: {0}")]
    DuplicateRule(String),

    #[error("Rule '{0}' has no usable category characters")]
    EmptyCategory(String),

    #[error("Invalid pattern for '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Structured payload could not be restored: {0}")]
    StructuredRestore(#[from] serde_json::Error),
}
