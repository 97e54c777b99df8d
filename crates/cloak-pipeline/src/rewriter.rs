//! Per-message placeholder redaction and restoration
//!
//! Human, system and tool messages have their text rewritten. Assistant
//! messages additionally have the strings inside their tool-call arguments
//! redacted, and are restored through the JSON form of the tool calls.
//! Unchanged messages come back borrowed.

use cloak_core::normalized::{Message, MessageContent, ToolCall};
use cloak_core::Error;
use cloak_pii::{RedactionMap, Redactor, restore, restore_json};
use serde_json::Value;
use std::borrow::Cow;
use tracing::warn;

/// Redact a single message, recording every replaced value in `map`.
///
/// Tool-call arguments are redacted string by string, so the arguments stay
/// well-formed JSON whatever the rules match.
pub fn redact_message<'m>(
    message: &'m Message,
    redactor: &dyn Redactor,
    map: &mut RedactionMap,
) -> Cow<'m, Message> {
    if redactor.is_noop() {
        return Cow::Borrowed(message);
    }

    let content = message.content().map_text(|text| match redactor.redact(text, map) {
        Cow::Borrowed(_) => None,
        Cow::Owned(redacted) => Some(redacted),
    });

    let tool_calls = match message.tool_calls() {
        [] => None,
        calls => redact_tool_calls(calls, redactor, map),
    };

    rebuild(message, content, tool_calls)
}

fn redact_tool_calls(
    calls: &[ToolCall],
    redactor: &dyn Redactor,
    map: &mut RedactionMap,
) -> Option<Vec<ToolCall>> {
    let mut changed = false;
    let redacted = calls
        .iter()
        .map(|call| match redact_value(&call.args, redactor, map) {
            Some(args) => {
                changed = true;
                ToolCall {
                    args,
                    ..call.clone()
                }
            }
            None => call.clone(),
        })
        .collect();

    changed.then_some(redacted)
}

/// Redact every string inside a JSON value. `None` when nothing matched.
fn redact_value(value: &Value, redactor: &dyn Redactor, map: &mut RedactionMap) -> Option<Value> {
    match value {
        Value::String(text) => match redactor.redact(text, map) {
            Cow::Borrowed(_) => None,
            Cow::Owned(redacted) => Some(Value::String(redacted)),
        },
        Value::Array(items) => {
            let redacted: Vec<_> = items
                .iter()
                .map(|item| redact_value(item, redactor, map))
                .collect();
            if redacted.iter().all(Option::is_none) {
                return None;
            }

            Some(Value::Array(
                redacted
                    .into_iter()
                    .zip(items)
                    .map(|(new, old)| new.unwrap_or_else(|| old.clone()))
                    .collect(),
            ))
        }
        Value::Object(fields) => {
            let redacted: Vec<_> = fields
                .iter()
                .map(|(key, field)| (key, redact_value(field, redactor, map)))
                .collect();
            if redacted.iter().all(|(_, new)| new.is_none()) {
                return None;
            }

            Some(Value::Object(
                redacted
                    .into_iter()
                    .zip(fields.values())
                    .map(|((key, new), old)| (key.clone(), new.unwrap_or_else(|| old.clone())))
                    .collect(),
            ))
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => None,
    }
}

/// Restore every known placeholder in a message.
///
/// Tool calls that no longer parse after restoration are kept as they were
/// and a warning is logged; the content is still restored.
pub fn restore_message<'m>(message: &'m Message, map: &RedactionMap) -> Cow<'m, Message> {
    if map.is_empty() {
        return Cow::Borrowed(message);
    }

    let content = message.content().map_text(|text| {
        let restored = restore(text, map);
        restored.changed.then(|| restored.text.into_owned())
    });

    let tool_calls = match message.tool_calls() {
        [] => None,
        calls => match restore_json(&calls.to_vec(), map) {
            Ok(restored) => restored,
            Err(e) => {
                let error = Error::StructuredPayload(e.to_string());
                warn!(
                    message_id = ?message.id(),
                    error = %error,
                    "Leaving tool calls unrestored"
                );
                None
            }
        },
    };

    rebuild(message, content, tool_calls)
}

fn rebuild<'m>(
    message: &'m Message,
    content: Option<MessageContent>,
    tool_calls: Option<Vec<ToolCall>>,
) -> Cow<'m, Message> {
    if content.is_none() && tool_calls.is_none() {
        return Cow::Borrowed(message);
    }

    let rewritten = match content {
        Some(content) => message.with_content(content),
        None => message.clone(),
    };

    let rewritten = match (rewritten, tool_calls) {
        (Message::Assistant(assistant), Some(calls)) => {
            Message::Assistant(assistant.with_tool_calls(calls))
        }
        (rewritten, _) => rewritten,
    };

    Cow::Owned(rewritten)
}
