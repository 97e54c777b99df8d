//! Anthropic text generator
//!
//! Implements [`TextGenerator`] on top of the Messages API. Structured output
//! forces the model to call a single tool whose input schema is the requested
//! schema, and returns the tool input.

use crate::{
    EgressError, Result,
    client::{HttpClientConfig, create_client, with_retry},
    parse_retry_after,
};
use async_trait::async_trait;
use cloak_core::{
    normalized::{AssistantMessage, ContentBlock, Message, MessageBody, MessageContent, ToolCall},
    provider::{GenerationRequest, OutputSchema, TextGenerator},
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Anthropic connector configuration
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL for Anthropic API (default: https://api.anthropic.com)
    pub base_url: String,

    /// Anthropic API version (default: 2023-06-01)
    pub api_version: String,

    /// Model to call
    pub model: String,

    /// Upper bound on generated tokens
    pub max_tokens: u32,

    pub temperature: Option<f32>,

    /// HTTP client configuration
    pub client_config: HttpClientConfig,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com".to_string(),
            api_version: "2023-06-01".to_string(),
            model: model.into(),
            max_tokens: 4096,
            temperature: Some(0.0),
            client_config: HttpClientConfig::default(),
        }
    }

    /// Set the base URL (for custom endpoints)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_client_config(mut self, client_config: HttpClientConfig) -> Self {
        self.client_config = client_config;
        self
    }
}

/// Anthropic connector
pub struct AnthropicConnector {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicConnector {
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(EgressError::ConfigError(
                "Anthropic API key is empty".to_string(),
            ));
        }

        let client = create_client(&config.client_config)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    async fn send(&self, request: &AnthropicRequest) -> Result<AnthropicResponse> {
        debug!("┌─────────────────────────────────────────────────────────");
        debug!("│ Anthropic Request Headers");
        debug!("├─────────────────────────────────────────────────────────");
        debug!("│ x-api-key: <api_key>");
        debug!("│ anthropic-version: {}", self.config.api_version);
        debug!("│ Content-Type: application/json");
        debug!("└─────────────────────────────────────────────────────────");

        with_retry(&self.config.client_config, || async move {
            let response = self
                .client
                .post(format!("{}/v1/messages", self.config.base_url))
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", &self.config.api_version)
                .header("Content-Type", "application/json")
                .json(request)
                .send()
                .await?;

            debug!("Anthropic response status: {}", response.status());
            response.handle_anthropic_response().await
        })
        .await
    }
}

#[async_trait]
impl TextGenerator for AnthropicConnector {
    #[instrument(skip(self, request), fields(model = %self.config.model, messages = request.messages.len()))]
    async fn generate(&self, request: GenerationRequest) -> cloak_core::Result<Message> {
        let anthropic_req = to_anthropic_request(&request, &self.config)?;
        let response = self.send(&anthropic_req).await?;

        debug!(
            model = %response.model,
            stop_reason = ?response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Anthropic reply received"
        );

        Ok(from_anthropic_response(response))
    }

    #[instrument(skip(self, request, schema), fields(model = %self.config.model, schema = %schema.name))]
    async fn generate_structured(
        &self,
        request: GenerationRequest,
        schema: &OutputSchema,
    ) -> cloak_core::Result<serde_json::Value> {
        let mut anthropic_req = to_anthropic_request(&request, &self.config)?;
        anthropic_req.tools = Some(vec![AnthropicTool {
            name: schema.name.clone(),
            description: Some(schema.description.clone()),
            input_schema: schema.schema.clone(),
        }]);
        anthropic_req.tool_choice = Some(AnthropicToolChoice::Tool {
            name: schema.name.clone(),
        });

        let response = self.send(&anthropic_req).await?;

        response
            .content
            .into_iter()
            .find_map(|block| match block {
                AnthropicContentBlock::ToolUse { name, input, .. } if name == schema.name => {
                    Some(input)
                }
                _ => None,
            })
            .ok_or_else(|| {
                EgressError::ParseError(format!(
                    "Anthropic reply carries no '{}' tool call",
                    schema.name
                ))
                .into()
            })
    }
}

// Wire types

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<AnthropicToolChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: AnthropicContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<AnthropicContentBlock>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    Image {
        source: AnthropicSource,
    },
    Document {
        source: AnthropicSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
    /// Block kinds this connector does not consume (thinking, ...)
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicSource {
    Base64 { media_type: String, data: String },
    Url { url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnthropicTool {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    input_schema: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicToolChoice {
    Tool { name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnthropicResponse {
    id: String,
    content: Vec<AnthropicContentBlock>,
    model: String,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: AnthropicUsage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

// Conversion functions

fn to_anthropic_request(
    request: &GenerationRequest,
    config: &AnthropicConfig,
) -> Result<AnthropicRequest> {
    // System messages are folded into the top-level system prompt
    let system_parts: Vec<String> = request
        .system
        .iter()
        .cloned()
        .chain(request.messages.iter().filter_map(|m| match m {
            Message::System(body) => Some(body.content.text().into_owned()),
            _ => None,
        }))
        .filter(|text| !text.is_empty())
        .collect();

    let messages = request
        .messages
        .iter()
        .filter_map(|message| match message {
            Message::System(_) => None,
            Message::Human(body) => Some(AnthropicMessage {
                role: "user".to_string(),
                content: to_anthropic_content(&body.content),
            }),
            Message::Tool(tool) => Some(AnthropicMessage {
                role: "user".to_string(),
                content: AnthropicContent::Blocks(vec![AnthropicContentBlock::ToolResult {
                    tool_use_id: tool.tool_call_id.clone(),
                    content: tool.body.content.text().into_owned(),
                }]),
            }),
            Message::Assistant(assistant) => Some(AnthropicMessage {
                role: "assistant".to_string(),
                content: to_assistant_content(assistant),
            }),
        })
        .collect::<Vec<_>>();

    if messages.is_empty() {
        return Err(EgressError::ConfigError(
            "Anthropic request needs at least one non-system message".to_string(),
        ));
    }

    Ok(AnthropicRequest {
        model: config.model.clone(),
        messages,
        max_tokens: config.max_tokens,
        system: (!system_parts.is_empty()).then(|| system_parts.join("\n\n")),
        temperature: config.temperature,
        tools: None,
        tool_choice: None,
    })
}

fn to_anthropic_content(content: &MessageContent) -> AnthropicContent {
    match content {
        MessageContent::Text(text) => AnthropicContent::Text(text.clone()),
        MessageContent::Blocks(blocks) => AnthropicContent::Blocks(
            blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => {
                        Some(AnthropicContentBlock::Text { text: text.clone() })
                    }
                    ContentBlock::File { mime_type, data } if mime_type == "application/pdf" => {
                        Some(AnthropicContentBlock::Document {
                            source: AnthropicSource::Base64 {
                                media_type: mime_type.clone(),
                                data: data.clone(),
                            },
                        })
                    }
                    ContentBlock::File { mime_type, data } if mime_type.starts_with("image/") => {
                        Some(AnthropicContentBlock::Image {
                            source: AnthropicSource::Base64 {
                                media_type: mime_type.clone(),
                                data: data.clone(),
                            },
                        })
                    }
                    ContentBlock::File { mime_type, .. } => {
                        debug!(mime_type = %mime_type, "Skipping unsupported file in Anthropic request");
                        None
                    }
                    ContentBlock::Image { url } => Some(AnthropicContentBlock::Image {
                        source: AnthropicSource::Url { url: url.clone() },
                    }),
                })
                .collect(),
        ),
    }
}

fn to_assistant_content(assistant: &AssistantMessage) -> AnthropicContent {
    if assistant.tool_calls.is_empty() {
        return to_anthropic_content(&assistant.body.content);
    }

    let text = assistant.body.content.text();
    let mut blocks = Vec::with_capacity(assistant.tool_calls.len() + 1);
    if !text.is_empty() {
        blocks.push(AnthropicContentBlock::Text {
            text: text.into_owned(),
        });
    }

    for (index, call) in assistant.tool_calls.iter().enumerate() {
        blocks.push(AnthropicContentBlock::ToolUse {
            id: call
                .id
                .clone()
                .unwrap_or_else(|| format!("toolu_{}", index)),
            name: call.name.clone(),
            input: call.args.clone(),
        });
    }

    AnthropicContent::Blocks(blocks)
}

fn from_anthropic_response(response: AnthropicResponse) -> Message {
    let mut texts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in response.content {
        match block {
            AnthropicContentBlock::Text { text } => texts.push(text),
            AnthropicContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                id: Some(id),
                name,
                args: input,
            }),
            other => debug!("Ignoring {:?} block in Anthropic response", other),
        }
    }

    Message::Assistant(AssistantMessage {
        body: MessageBody {
            id: Some(response.id),
            name: None,
            content: MessageContent::Text(texts.join("\n")),
        },
        tool_calls,
    })
}

// Response handling trait extension

trait AnthropicResponseExt {
    async fn handle_anthropic_response(self) -> Result<AnthropicResponse>;
}

impl AnthropicResponseExt for reqwest::Response {
    async fn handle_anthropic_response(self) -> Result<AnthropicResponse> {
        let status = self.status();

        if !status.is_success() {
            let status_code = status.as_u16();

            if status_code == 429 {
                let retry_after_secs = self
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.to_str().ok())
                    .and_then(parse_retry_after);
                return Err(EgressError::RateLimitExceeded { retry_after_secs });
            }

            let body = self
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            return Err(EgressError::ProviderError {
                status_code,
                message: body,
            });
        }

        self.json::<AnthropicResponse>().await.map_err(|e| {
            EgressError::ParseError(format!("Failed to parse Anthropic response: {}", e))
        })
    }
}

#[cfg(test)]
mod tests;
