//! Normalized conversation message types
//!
//! Messages form a closed set of kinds (human, system, tool, assistant). The
//! wire form carries the kind in a `type` field; any other kind is rejected
//! while deserializing.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Kind of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Human,
    System,
    Tool,
    Assistant,
}

impl MessageKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Human => "human",
            MessageKind::System => "system",
            MessageKind::Tool => "tool",
            MessageKind::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "human" | "user" => Ok(MessageKind::Human),
            "system" => Ok(MessageKind::System),
            "tool" => Ok(MessageKind::Tool),
            "assistant" | "ai" => Ok(MessageKind::Assistant),
            other => Err(Error::UnsupportedMessageKind(other.to_string())),
        }
    }
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireMessage", into = "WireMessage")]
pub enum Message {
    /// Message written by the end user
    Human(MessageBody),

    /// System instructions
    System(MessageBody),

    /// Result of a tool invocation
    Tool(ToolMessage),

    /// Model-generated message, optionally carrying tool calls
    Assistant(AssistantMessage),
}

/// Fields shared by every message kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    /// Optional message identifier
    pub id: Option<String>,

    /// Optional name of the sender
    pub name: Option<String>,

    /// Content of the message (text or blocks)
    pub content: MessageContent,
}

/// Tool response message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMessage {
    pub body: MessageBody,

    /// ID of the tool call this message answers
    pub tool_call_id: String,
}

/// Assistant (model-generated) message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub body: MessageBody,

    /// Tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
}

impl AssistantMessage {
    /// Copy of this message with the tool calls replaced
    pub fn with_tool_calls(&self, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            body: self.body.clone(),
            tool_calls,
        }
    }
}

/// A tool invocation requested by the assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Name of the tool to call
    pub name: String,

    /// Structured arguments
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Content of a message (plain text or ordered blocks)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),

    /// Typed content blocks (text, file attachments, images)
    Blocks(Vec<ContentBlock>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

/// A typed block of message content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    File {
        #[serde(alias = "mimeType")]
        mime_type: String,
        /// Base64-encoded file data
        data: String,
    },
    Image {
        url: String,
    },
}

impl MessageContent {
    /// Text of the content; text blocks are joined with a newline
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            MessageContent::Text(text) => Cow::Borrowed(text.as_str()),
            MessageContent::Blocks(blocks) => {
                let texts: Vec<&str> = blocks
                    .iter()
                    .filter_map(|block| match block {
                        ContentBlock::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                Cow::Owned(texts.join("\n"))
            }
        }
    }

    /// First file attachment as `(mime_type, data)`
    pub fn file(&self) -> Option<(&str, &str)> {
        match self {
            MessageContent::Text(_) => None,
            MessageContent::Blocks(blocks) => blocks.iter().find_map(|block| match block {
                ContentBlock::File { mime_type, data } => Some((mime_type.as_str(), data.as_str())),
                _ => None,
            }),
        }
    }

    /// Rewrite every text piece with `f`.
    ///
    /// `f` returns `None` when a piece is unchanged. Non-text blocks are kept
    /// in place. Returns `None` when nothing changed.
    pub fn map_text<F>(&self, mut f: F) -> Option<MessageContent>
    where
        F: FnMut(&str) -> Option<String>,
    {
        match self {
            MessageContent::Text(text) => f(text).map(MessageContent::Text),
            MessageContent::Blocks(blocks) => {
                let mut changed = false;
                let rewritten: Vec<ContentBlock> = blocks
                    .iter()
                    .map(|block| match block {
                        ContentBlock::Text { text } => match f(text) {
                            Some(new_text) => {
                                changed = true;
                                ContentBlock::Text { text: new_text }
                            }
                            None => block.clone(),
                        },
                        other => other.clone(),
                    })
                    .collect();

                changed.then_some(MessageContent::Blocks(rewritten))
            }
        }
    }
}

impl Message {
    /// Create a human message with text content
    pub fn human(text: impl Into<String>) -> Self {
        Message::Human(MessageBody {
            content: MessageContent::Text(text.into()),
            ..Default::default()
        })
    }

    /// Create a system message with text content
    pub fn system(text: impl Into<String>) -> Self {
        Message::System(MessageBody {
            content: MessageContent::Text(text.into()),
            ..Default::default()
        })
    }

    /// Create an assistant message with text content and no tool calls
    pub fn assistant(text: impl Into<String>) -> Self {
        Message::Assistant(AssistantMessage {
            body: MessageBody {
                content: MessageContent::Text(text.into()),
                ..Default::default()
            },
            tool_calls: Vec::new(),
        })
    }

    /// Create a tool message answering `tool_call_id`
    pub fn tool(text: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Message::Tool(ToolMessage {
            body: MessageBody {
                content: MessageContent::Text(text.into()),
                ..Default::default()
            },
            tool_call_id: tool_call_id.into(),
        })
    }

    /// Kind of this message
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Human(_) => MessageKind::Human,
            Message::System(_) => MessageKind::System,
            Message::Tool(_) => MessageKind::Tool,
            Message::Assistant(_) => MessageKind::Assistant,
        }
    }

    /// Shared message fields
    pub fn body(&self) -> &MessageBody {
        match self {
            Message::Human(body) | Message::System(body) => body,
            Message::Tool(tool) => &tool.body,
            Message::Assistant(assistant) => &assistant.body,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.body().id.as_deref()
    }

    pub fn content(&self) -> &MessageContent {
        &self.body().content
    }

    /// Text of the message content
    pub fn text(&self) -> Cow<'_, str> {
        self.content().text()
    }

    /// Tool calls (always empty for non-assistant messages)
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant(assistant) => &assistant.tool_calls,
            _ => &[],
        }
    }

    /// Copy of this message, same kind and fields, with the content replaced
    pub fn with_content(&self, content: MessageContent) -> Message {
        let replace = |body: &MessageBody| MessageBody {
            content: content.clone(),
            ..body.clone()
        };

        match self {
            Message::Human(body) => Message::Human(replace(body)),
            Message::System(body) => Message::System(replace(body)),
            Message::Tool(tool) => Message::Tool(ToolMessage {
                body: replace(&tool.body),
                tool_call_id: tool.tool_call_id.clone(),
            }),
            Message::Assistant(assistant) => Message::Assistant(AssistantMessage {
                body: replace(&assistant.body),
                tool_calls: assistant.tool_calls.clone(),
            }),
        }
    }
}

/// Wire representation of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(default)]
    content: MessageContent,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ToolCall>,
}

impl TryFrom<WireMessage> for Message {
    type Error = Error;

    fn try_from(wire: WireMessage) -> Result<Self> {
        let kind: MessageKind = wire.kind.parse()?;
        let body = MessageBody {
            id: wire.id,
            name: wire.name,
            content: wire.content,
        };

        Ok(match kind {
            MessageKind::Human => Message::Human(body),
            MessageKind::System => Message::System(body),
            MessageKind::Tool => Message::Tool(ToolMessage {
                body,
                tool_call_id: wire.tool_call_id.ok_or_else(|| {
                    Error::InvalidRequest("tool message is missing tool_call_id".to_string())
                })?,
            }),
            MessageKind::Assistant => Message::Assistant(AssistantMessage {
                body,
                tool_calls: wire.tool_calls,
            }),
        })
    }
}

impl From<Message> for WireMessage {
    fn from(message: Message) -> Self {
        let kind = message.kind().as_str().to_string();
        let (body, tool_call_id, tool_calls) = match message {
            Message::Human(body) | Message::System(body) => (body, None, Vec::new()),
            Message::Tool(tool) => (tool.body, Some(tool.tool_call_id), Vec::new()),
            Message::Assistant(assistant) => (assistant.body, None, assistant.tool_calls),
        };

        WireMessage {
            kind,
            id: body.id,
            name: body.name,
            content: body.content,
            tool_call_id,
            tool_calls,
        }
    }
}
