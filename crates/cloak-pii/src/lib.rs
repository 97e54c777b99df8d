//! Cloak PII Redaction and Restoration
//!
//! This crate provides reversible PII redaction:
//! - Rule sets of named, case-insensitive patterns (email by default)
//! - Placeholder redaction recording originals in a per-invocation map
//! - Restoration of placeholders in text and JSON payloads
//! - The detection contract used by model-based detection, with
//!   literal value substitution in both directions

pub mod detection;
pub mod error;
pub mod placeholder;
pub mod redactor;
pub mod restorer;
pub mod rules;

pub use detection::{DetectionResult, PiiItem, redact_by_value, restore_by_value};
pub use error::PiiError;
pub use placeholder::{RedactionMap, placeholder_token};
pub use redactor::{PlaceholderRedactor, Redactor};
pub use restorer::{Restoration, restore, restore_json};
pub use rules::{Rule, RuleConfig, RuleSet};
