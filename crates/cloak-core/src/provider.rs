//! Capability trait definitions
//!
//! Text generation and document loading are external collaborators. The
//! pipeline only sees these traits; implementations live in other crates.

use crate::{Result, normalized::Message};
use serde::de::DeserializeOwned;

/// Input of a text-generation call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    /// Conversation to send
    pub messages: Vec<Message>,

    /// Optional system prompt
    pub system: Option<String>,
}

impl GenerationRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            system: None,
        }
    }

    /// Set the system prompt
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Schema a structured reply must satisfy
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    /// Short identifier of the schema
    pub name: String,

    /// What the structured reply represents
    pub description: String,

    /// JSON schema of the reply
    pub schema: serde_json::Value,
}

#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a free-text reply
    async fn generate(&self, request: GenerationRequest) -> Result<Message>;

    /// Generate a reply constrained to `schema`
    async fn generate_structured(
        &self,
        request: GenerationRequest,
        schema: &OutputSchema,
    ) -> Result<serde_json::Value>;
}

/// Generate a structured reply and deserialize it into `T`
pub async fn generate_typed<T: DeserializeOwned>(
    generator: &dyn TextGenerator,
    request: GenerationRequest,
    schema: &OutputSchema,
) -> Result<T> {
    let value = generator.generate_structured(request, schema).await?;
    Ok(serde_json::from_value(value)?)
}

#[async_trait::async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Extract plain text from a document.
    ///
    /// Unsupported mime types yield an empty string rather than an error.
    async fn load(&self, bytes: &[u8], mime_type: &str) -> Result<String>;
}
