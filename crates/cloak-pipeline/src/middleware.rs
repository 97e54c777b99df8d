//! Redaction middleware around a single model call
//!
//! The history is redacted with placeholder tokens before the model sees it,
//! and the model's answer is restored before it is handed back. Every call
//! gets its own redaction map.

use crate::rewriter::{redact_message, restore_message};
use cloak_core::normalized::{Message, MessageContent};
use cloak_core::provider::{GenerationRequest, TextGenerator};
use cloak_core::{Error, Result};
use cloak_pii::{PlaceholderRedactor, RedactionMap, RuleSet};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Tool-call name prefix marking structured extraction calls
pub const EXTRACT_TOOL_PREFIX: &str = "extract-";

/// One model call routed through the middleware
#[derive(Debug, Clone, Default)]
pub struct ModelCall {
    pub messages: Vec<Message>,
    pub system: Option<String>,

    /// Rules for this call only; override the middleware rules
    pub rules: Option<Arc<RuleSet>>,
}

impl ModelCall {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_rules(mut self, rules: Arc<RuleSet>) -> Self {
        self.rules = Some(rules);
        self
    }
}

/// Result of a model call
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutcome {
    /// Original history followed by the restored model response
    pub messages: Vec<Message>,

    /// Restored structured payload, when the response carried one
    pub structured_response: Option<Value>,

    /// Map used for this call
    pub redactions: RedactionMap,
}

impl ModelOutcome {
    /// The model response
    pub fn response(&self) -> Option<&Message> {
        self.messages.last()
    }
}

pub struct RedactionMiddleware {
    generator: Arc<dyn TextGenerator>,
    rules: Option<Arc<RuleSet>>,
    default_rules: Arc<RuleSet>,
}

impl RedactionMiddleware {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            rules: None,
            default_rules: Arc::new(RuleSet::default()),
        }
    }

    /// Rules applied when a call carries none of its own
    pub fn with_rules(mut self, rules: Arc<RuleSet>) -> Self {
        self.rules = Some(rules);
        self
    }

    fn resolve_rules(&self, call: &ModelCall) -> Arc<RuleSet> {
        call.rules
            .clone()
            .or_else(|| self.rules.clone())
            .unwrap_or_else(|| self.default_rules.clone())
    }

    /// Run one model call with the history redacted and the response restored
    #[instrument(skip(self, call), fields(messages = call.messages.len()))]
    pub async fn call(&self, call: ModelCall) -> Result<ModelOutcome> {
        let rules = self.resolve_rules(&call);
        let ModelCall {
            messages: history,
            system,
            ..
        } = call;

        if rules.is_empty() {
            debug!("No redaction rules, passing call through");
            let response = self.invoke(history.clone(), system).await?;

            let mut messages = history;
            messages.push(response);
            return Ok(ModelOutcome {
                messages,
                structured_response: None,
                redactions: RedactionMap::new(),
            });
        }

        let redactor = PlaceholderRedactor::new(rules);
        let mut map = RedactionMap::new();
        let redacted = history
            .iter()
            .map(|message| redact_message(message, &redactor, &mut map).into_owned())
            .collect::<Vec<_>>();

        debug!(redactions = map.len(), "Redacted conversation history");

        let response = self.invoke(redacted, system).await?;

        let mut messages = history;
        messages.push(response);
        let structured_response = restore_after_model(&mut messages, &map);

        Ok(ModelOutcome {
            messages,
            structured_response,
            redactions: map,
        })
    }

    async fn invoke(&self, messages: Vec<Message>, system: Option<String>) -> Result<Message> {
        let mut request = GenerationRequest::new(messages);
        if let Some(system) = system {
            request = request.with_system(system);
        }

        self.generator.generate(request).await.map_err(|e| match e {
            Error::Generation(_) => e,
            other => Error::Generation(other.to_string()),
        })
    }
}

/// Restore the model response in place and pick up a structured payload.
///
/// The last message is restored when it is an assistant message. A JSON
/// object in its text becomes the structured response. The arguments of an
/// `extract-` tool call in the message before it take precedence; that
/// message comes from the caller's history and is already unredacted.
fn restore_after_model(messages: &mut [Message], map: &RedactionMap) -> Option<Value> {
    if map.is_empty() {
        return None;
    }

    let last = messages.len().checked_sub(1)?;
    if !matches!(messages[last], Message::Assistant(_)) {
        return None;
    }

    let restored = restore_message(&messages[last], map).into_owned();
    let structured = json_object(&restored);
    messages[last] = restored;

    let extract_args = last.checked_sub(1).and_then(|previous| {
        messages[previous]
            .tool_calls()
            .iter()
            .find(|call| call.name.starts_with(EXTRACT_TOOL_PREFIX))
            .map(|call| {
                debug!(tool = %call.name, "Using extraction arguments as structured response");
                call.args.clone()
            })
    });

    extract_args.or(structured)
}

/// JSON object carried as the plain text of a message without tool calls
fn json_object(message: &Message) -> Option<Value> {
    if !message.tool_calls().is_empty() {
        return None;
    }

    let MessageContent::Text(text) = message.content() else {
        return None;
    };

    let text = text.trim();
    if !(text.starts_with('{') && text.ends_with('}')) {
        return None;
    }

    serde_json::from_str(text).ok()
}
