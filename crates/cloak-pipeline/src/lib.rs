//! Cloak Pipeline
//!
//! Orchestrates reversible PII redaction around text generation:
//! - Message rewriting (placeholder redaction and restoration per message kind)
//! - Redaction middleware wrapping a single model call
//! - Document summarization pipeline with model-based detection
//! - Configuration loading

pub mod config;
pub mod loader;
pub mod middleware;
pub mod prompts;
pub mod rewriter;
pub mod sequencer;
pub mod stages;
pub mod state;

pub use config::{CloakConfig, DetectionMode, LoggingConfig, PipelineConfig, ProviderConfig};
pub use loader::PdfDocumentLoader;
pub use middleware::{ModelCall, ModelOutcome, RedactionMiddleware};
pub use rewriter::{redact_message, restore_message};
pub use sequencer::{DocumentPipeline, Stage};
pub use state::{PipelineState, StateUpdate};
