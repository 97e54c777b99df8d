//! Configuration for the redaction pipelines and the Anthropic provider
//!
//! Loaded from YAML, or TOML when the file has a `.toml` extension, then
//! overlaid with environment variables.

use crate::prompts;
use cloak_core::{Error, Result};
use cloak_pii::{RuleConfig, RuleSet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloakConfig {
    /// Ordered redaction rules; the built-in email rule applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RuleConfig>>,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// When the document pipeline calls the detection model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Skip detection when the state already carries a result
    #[default]
    Reuse,

    /// Detect on every invocation
    Always,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub detection_mode: DetectionMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detect_prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarize_prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_prompt: Option<String>,
}

impl PipelineConfig {
    pub fn detect_prompt(&self) -> &str {
        self.detect_prompt.as_deref().unwrap_or(prompts::DETECT_PII)
    }

    pub fn summarize_prompt(&self) -> &str {
        self.summarize_prompt.as_deref().unwrap_or(prompts::SUMMARIZE)
    }

    pub fn conversation_prompt(&self) -> &str {
        self.conversation_prompt
            .as_deref()
            .unwrap_or(prompts::CONVERSATION)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model answering conversations and writing summaries
    #[serde(default = "default_model")]
    pub model: String,

    /// Smaller model used for PII detection
    #[serde(default = "default_detection_model")]
    pub detection_model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            detection_model: default_detection_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl CloakConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {}", path.display(), e))
            })?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {}", path.display(), e))
            })?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) {
        if let Ok(api_key) = std::env::var("ANTHROPIC_API_KEY") {
            self.provider.api_key = Some(api_key);
        }

        if let Ok(model) = std::env::var("CLOAK_MODEL") {
            self.provider.model = model;
        }

        if let Ok(level) = std::env::var("CLOAK_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(mode) = std::env::var("CLOAK_DETECTION_MODE") {
            match mode.to_lowercase().as_str() {
                "reuse" => self.pipeline.detection_mode = DetectionMode::Reuse,
                "always" => self.pipeline.detection_mode = DetectionMode::Always,
                _ => warn!("Invalid CLOAK_DETECTION_MODE '{}', keeping configured value", mode),
            }
        }
    }

    /// Compile the configured rules.
    ///
    /// Returns `None` when no rules are configured, so callers fall back to
    /// their own default. An empty list is kept and disables redaction.
    pub fn rule_set(&self) -> Result<Option<RuleSet>> {
        self.rules
            .as_ref()
            .map(|configs| {
                RuleSet::new(configs.iter().cloned())
                    .map_err(|e| Error::Config(format!("Invalid redaction rule: {}", e)))
            })
            .transpose()
    }
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-5".to_string()
}

fn default_detection_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_log_level() -> String {
    "info".to_string()
}
