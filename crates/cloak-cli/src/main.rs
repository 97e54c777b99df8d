//! Cloak CLI
//!
//! Command-line interface for redacting, restoring and summarizing text with
//! reversible PII placeholders

use anyhow::{Context, bail};
use base64::Engine;
use clap::{Parser, Subcommand};
use cloak_core::normalized::{ContentBlock, Message, MessageBody, MessageContent};
use cloak_egress::{AnthropicConfig, AnthropicConnector};
use cloak_pii::{PlaceholderRedactor, RedactionMap, Redactor, RuleSet, restore};
use cloak_pipeline::loader::PDF_MIME_TYPE;
use cloak_pipeline::{CloakConfig, DocumentPipeline, ModelCall, PdfDocumentLoader, RedactionMiddleware};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "cloak")]
#[command(about = "Cloak - Reversible PII redaction around LLM calls", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (YAML or TOML)
    #[arg(short, long, value_name = "FILE", env = "CLOAK_CONFIG", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace rule matches with placeholders and print the text with its map
    Redact {
        /// Read text from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Put original values back into placeholder text
    Restore {
        /// Redaction map produced by `cloak redact`
        #[arg(short, long)]
        map: PathBuf,

        /// Read text from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Send one message to the model with its PII redacted
    Chat {
        #[arg(short, long)]
        message: String,
    },
    /// Summarize a document without the model seeing its PII
    Summarize {
        /// PDF document to attach
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "Summarize this document.")]
        message: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CloakConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => CloakConfig::default(),
    };

    // Environment variables override the config file
    config.merge_env();

    init_tracing(&config)?;

    if let Some(path) = &cli.config {
        info!("Loaded configuration from {}", path.display());
    }

    match cli.command {
        Commands::Redact { input } => {
            let text = read_input(input.as_deref())?;
            let redactor = PlaceholderRedactor::new(Arc::new(rules(&config)?));

            let mut map = RedactionMap::new();
            let redacted = redactor.redact(&text, &mut map);
            info!(placeholders = map.len(), "Redacted input");

            let output = serde_json::json!({ "redacted": redacted, "map": map });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Restore { map, input } => {
            let map: RedactionMap = serde_json::from_str(
                &std::fs::read_to_string(&map)
                    .with_context(|| format!("Failed to read map {}", map.display()))?,
            )
            .context("Redaction map must be a JSON object of id to value")?;
            let text = read_input(input.as_deref())?;

            print!("{}", restore(&text, &map).text);
        }
        Commands::Chat { message } => {
            let generator = connector(&config, &config.provider.model)?;
            let middleware =
                RedactionMiddleware::new(Arc::new(generator)).with_rules(Arc::new(rules(&config)?));

            let outcome = middleware
                .call(
                    ModelCall::new(vec![Message::human(message)])
                        .with_system(config.pipeline.conversation_prompt()),
                )
                .await?;
            info!(placeholders = outcome.redactions.len(), "Chat round trip finished");

            match outcome.response() {
                Some(response) => println!("{}", response.text()),
                None => bail!("Model returned no answer"),
            }
        }
        Commands::Summarize { file, message } => {
            let mime_type = document_mime_type(&file)?;
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let request = document_request(&message, &bytes, mime_type);

            let pipeline = DocumentPipeline::new(
                Arc::new(PdfDocumentLoader::new()),
                Arc::new(connector(&config, &config.provider.detection_model)?),
                Arc::new(connector(&config, &config.provider.model)?),
            )
            .with_config(config.pipeline.clone());

            let state = pipeline.run(vec![request]).await?;
            match state.last_message() {
                Some(answer @ Message::Assistant(_)) => println!("{}", answer.text()),
                _ => bail!("Pipeline finished without an answer"),
            }
        }
    }

    Ok(())
}

fn init_tracing(config: &CloakConfig) -> anyhow::Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so stdout stays machine readable
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn rules(config: &CloakConfig) -> anyhow::Result<RuleSet> {
    Ok(config.rule_set()?.unwrap_or_default())
}

fn connector(config: &CloakConfig, model: &str) -> anyhow::Result<AnthropicConnector> {
    let Some(api_key) = config.provider.api_key.as_deref() else {
        bail!("No API key configured, set ANTHROPIC_API_KEY or provider.api_key");
    };

    let anthropic = AnthropicConfig::new(api_key, model)
        .with_base_url(&config.provider.base_url)
        .with_max_tokens(config.provider.max_tokens);
    Ok(AnthropicConnector::new(anthropic)?)
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Mime type of a document the pipeline can extract text from
fn document_mime_type(path: &Path) -> anyhow::Result<&'static str> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if !is_pdf {
        bail!(
            "Only PDF documents can be summarized, got {}",
            path.display()
        );
    }

    Ok(PDF_MIME_TYPE)
}

fn document_request(message: &str, bytes: &[u8], mime_type: &str) -> Message {
    Message::Human(MessageBody {
        content: MessageContent::Blocks(vec![
            ContentBlock::Text {
                text: message.to_string(),
            },
            ContentBlock::File {
                mime_type: mime_type.to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
            },
        ]),
        ..Default::default()
    })
}
