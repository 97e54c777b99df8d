//! Document summarization pipeline
//!
//! Runs the stages in a fixed order over one [`PipelineState`]:
//! extract_file → detect_pii → remove_pii → summarize → restore_pii.

use crate::config::PipelineConfig;
use crate::stages;
use crate::state::{PipelineState, StateUpdate};
use cloak_core::normalized::Message;
use cloak_core::provider::{DocumentLoader, TextGenerator};
use cloak_core::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ExtractFile,
    DetectPii,
    RemovePii,
    Summarize,
    RestorePii,
}

impl Stage {
    /// Stages in execution order
    pub const ALL: [Stage; 5] = [
        Stage::ExtractFile,
        Stage::DetectPii,
        Stage::RemovePii,
        Stage::Summarize,
        Stage::RestorePii,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::ExtractFile => "extract_file",
            Stage::DetectPii => "detect_pii",
            Stage::RemovePii => "remove_pii",
            Stage::Summarize => "summarize",
            Stage::RestorePii => "restore_pii",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Summarizes a request and its attached document without exposing PII
/// to the summarization model.
///
/// Detection and summarization may use different models.
pub struct DocumentPipeline {
    loader: Arc<dyn DocumentLoader>,
    detector: Arc<dyn TextGenerator>,
    summarizer: Arc<dyn TextGenerator>,
    config: PipelineConfig,
}

impl DocumentPipeline {
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        detector: Arc<dyn TextGenerator>,
        summarizer: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            loader,
            detector,
            summarizer,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline over a conversation whose newest message is the request
    pub async fn run(&self, messages: Vec<Message>) -> Result<PipelineState> {
        self.run_state(PipelineState::new(messages)).await
    }

    /// Run the pipeline over a prepared state.
    ///
    /// A state that already carries a document or detection result lets the
    /// matching stages skip their external call.
    #[instrument(skip(self, state), fields(messages = state.messages.len()))]
    pub async fn run_state(&self, mut state: PipelineState) -> Result<PipelineState> {
        if state.messages.is_empty() {
            return Err(Error::InvalidRequest(
                "pipeline needs at least one message".to_string(),
            ));
        }

        for stage in Stage::ALL {
            let update = self.run_stage(stage, &state).await?;
            debug!(stage = %stage, "Stage complete");
            state.apply(update);
        }

        Ok(state)
    }

    async fn run_stage(&self, stage: Stage, state: &PipelineState) -> Result<StateUpdate> {
        match stage {
            Stage::ExtractFile => Ok(stages::extract_file(state, self.loader.as_ref()).await),
            Stage::DetectPii => Ok(stages::detect_pii(
                state,
                self.detector.as_ref(),
                self.config.detect_prompt(),
                self.config.detection_mode,
            )
            .await),
            Stage::RemovePii => stages::remove_pii(state),
            Stage::Summarize => {
                stages::summarize(
                    state,
                    self.summarizer.as_ref(),
                    self.config.summarize_prompt(),
                )
                .await
            }
            Stage::RestorePii => stages::restore_pii(state),
        }
    }
}
