//! Pipeline state threaded through the document pipeline stages

use cloak_core::normalized::Message;
use cloak_pii::DetectionResult;

/// Accumulated record of one pipeline invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineState {
    /// Conversation so far; the newest message is the request
    pub messages: Vec<Message>,

    /// Text extracted from an attached document
    pub document: Option<String>,

    /// Request text handed to detection (user text plus document)
    pub request_text: Option<String>,

    /// Detection result for the request text
    pub detection: Option<DetectionResult>,

    /// Request text with every detected value replaced
    pub redacted_text: Option<String>,

    /// Generated summary, still carrying stand-in values
    pub summary: Option<String>,
}

/// Partial result of a stage, merged into the state by the sequencer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    /// Messages to append
    pub messages: Vec<Message>,
    pub document: Option<String>,
    pub request_text: Option<String>,
    pub detection: Option<DetectionResult>,
    pub redacted_text: Option<String>,
    pub summary: Option<String>,
}

impl StateUpdate {
    /// Update that leaves the state untouched
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl PipelineState {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Merge a stage result: messages are appended, set fields overwrite
    pub fn apply(&mut self, update: StateUpdate) {
        self.messages.extend(update.messages);

        if let Some(document) = update.document {
            self.document = Some(document);
        }
        if let Some(request_text) = update.request_text {
            self.request_text = Some(request_text);
        }
        if let Some(detection) = update.detection {
            self.detection = Some(detection);
        }
        if let Some(redacted_text) = update.redacted_text {
            self.redacted_text = Some(redacted_text);
        }
        if let Some(summary) = update.summary {
            self.summary = Some(summary);
        }
    }

    /// Newest message of the conversation
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Extracted document text, if any and non-empty
    pub fn document_text(&self) -> Option<&str> {
        self.document.as_deref().filter(|doc| !doc.is_empty())
    }
}
