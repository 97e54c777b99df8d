//! Stages of the document summarization pipeline
//!
//! Each stage reads the state and returns a [`StateUpdate`]. Extraction and
//! detection degrade to "no document" and "no PII" on failure; generation
//! failures abort the run.

use crate::config::DetectionMode;
use crate::state::{PipelineState, StateUpdate};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cloak_core::normalized::Message;
use cloak_core::provider::{
    DocumentLoader, GenerationRequest, OutputSchema, TextGenerator, generate_typed,
};
use cloak_core::{Error, Result};
use cloak_pii::{DetectionResult, redact_by_value, restore_by_value};
use tracing::{debug, info, instrument, warn};

/// Load the document attached to the newest message
#[instrument(name = "extract_file", skip_all)]
pub async fn extract_file(state: &PipelineState, loader: &dyn DocumentLoader) -> StateUpdate {
    if state.document.is_some() {
        debug!("Document already extracted");
        return StateUpdate::none();
    }

    let Some((mime_type, data)) = state.last_message().and_then(|m| m.content().file()) else {
        debug!("No file attached to the request");
        return StateUpdate::none();
    };

    let bytes = match STANDARD.decode(data) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(mime_type, error = %e, "Attached file is not valid base64, continuing without document");
            return StateUpdate::none();
        }
    };

    match loader.load(&bytes, mime_type).await {
        Ok(text) => {
            info!(mime_type, chars = text.chars().count(), "Extracted document");
            StateUpdate {
                document: Some(text),
                ..Default::default()
            }
        }
        Err(e) => {
            warn!(mime_type, error = %e, "Document extraction failed, continuing without document");
            StateUpdate::none()
        }
    }
}

/// Request text sent to detection: user text plus the document, if any
pub fn request_text(state: &PipelineState) -> String {
    let user_text = state
        .last_message()
        .map(|message| message.text().into_owned())
        .unwrap_or_default();

    match state.document_text() {
        Some(document) => format!(
            "<user>\n{}\n</user>\n<document>\n{}\n</document>",
            user_text, document
        ),
        None => format!("<user>\n{}\n</user>", user_text),
    }
}

/// Schema handed to the detection model
pub fn detection_schema() -> OutputSchema {
    OutputSchema {
        name: "pii_detection".to_string(),
        description: "Every PII value found in the text with a same-category replacement"
            .to_string(),
        schema: DetectionResult::json_schema(),
    }
}

/// Ask the detection model for PII in the request text
#[instrument(name = "detect_pii", skip_all, fields(mode = ?mode))]
pub async fn detect_pii(
    state: &PipelineState,
    generator: &dyn TextGenerator,
    prompt: &str,
    mode: DetectionMode,
) -> StateUpdate {
    let text = request_text(state);

    if mode == DetectionMode::Reuse && state.detection.is_some() {
        debug!("Reusing existing detection result");
        return StateUpdate {
            request_text: Some(text),
            ..Default::default()
        };
    }

    let request = GenerationRequest::new(vec![Message::human(text.clone())]).with_system(prompt);

    let detection =
        match generate_typed::<DetectionResult>(generator, request, &detection_schema()).await {
            Ok(result) => result.normalized(),
            Err(e) => {
                warn!(error = %e, "PII detection failed, treating request as PII free");
                DetectionResult::none()
            }
        };

    info!(
        pii_found = detection.pii_found,
        items = detection.items.len(),
        "PII detection complete"
    );

    StateUpdate {
        request_text: Some(text),
        detection: Some(detection),
        ..Default::default()
    }
}

/// Replace every detected value in the request text with its stand-in
#[instrument(name = "remove_pii", skip_all)]
pub fn remove_pii(state: &PipelineState) -> Result<StateUpdate> {
    let text = match &state.request_text {
        Some(text) => text.clone(),
        None => request_text(state),
    };
    let detection = state.detection.clone().unwrap_or_default();

    let redacted = redact_by_value(&text, &detection)
        .map_err(|e| Error::Internal(format!("Failed to redact request: {}", e)))?
        .into_owned();

    debug!(items = detection.items.len(), "Redacted request text");

    Ok(StateUpdate {
        redacted_text: Some(redacted),
        ..Default::default()
    })
}

/// Summarize the redacted text
#[instrument(name = "summarize", skip_all)]
pub async fn summarize(
    state: &PipelineState,
    generator: &dyn TextGenerator,
    prompt: &str,
) -> Result<StateUpdate> {
    let text = state
        .redacted_text
        .clone()
        .ok_or_else(|| Error::Internal("No redacted text to summarize".to_string()))?;

    let request = GenerationRequest::new(vec![Message::human(text)]).with_system(prompt);
    let response = generator.generate(request).await.map_err(|e| match e {
        Error::Generation(_) => e,
        other => Error::Generation(other.to_string()),
    })?;

    let summary = response.text().into_owned();
    debug!(chars = summary.chars().count(), "Generated summary");

    Ok(StateUpdate {
        summary: Some(summary),
        ..Default::default()
    })
}

/// Put the detected values back into the summary and append it as the answer
#[instrument(name = "restore_pii", skip_all)]
pub fn restore_pii(state: &PipelineState) -> Result<StateUpdate> {
    let summary = state
        .summary
        .as_deref()
        .ok_or_else(|| Error::Internal("No summary to restore".to_string()))?;
    let detection = state.detection.clone().unwrap_or_default();

    let restored = restore_by_value(summary, &detection)
        .map_err(|e| Error::Internal(format!("Failed to restore summary: {}", e)))?;

    Ok(StateUpdate {
        messages: vec![Message::assistant(restored.into_owned())],
        ..Default::default()
    })
}
