//! End-to-end runs of the document summarization pipeline with fake capabilities

use async_trait::async_trait;
use cloak_core::normalized::{ContentBlock, Message, MessageBody, MessageContent};
use cloak_core::provider::{DocumentLoader, GenerationRequest, OutputSchema, TextGenerator};
use cloak_core::{Error, Result};
use cloak_pii::{DetectionResult, PiiItem};
use cloak_pipeline::{DetectionMode, DocumentPipeline, PipelineConfig, PipelineState};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Detection model returning a fixed payload
struct FakeDetector {
    payload: Option<Value>,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl FakeDetector {
    fn returning(payload: Value) -> Arc<Self> {
        Arc::new(Self {
            payload: Some(payload),
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            payload: None,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TextGenerator for FakeDetector {
    async fn generate(&self, _request: GenerationRequest) -> Result<Message> {
        Err(Error::Provider("detector only supports structured output".to_string()))
    }

    async fn generate_structured(
        &self,
        request: GenerationRequest,
        _schema: &OutputSchema,
    ) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs
            .lock()
            .unwrap()
            .push(request.messages[0].text().into_owned());

        self.payload
            .clone()
            .ok_or_else(|| Error::Provider("detector overloaded".to_string()))
    }
}

/// Summarizer echoing its input behind a prefix
struct EchoSummarizer {
    fail: bool,
    inputs: Mutex<Vec<String>>,
}

impl EchoSummarizer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            inputs: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            inputs: Mutex::new(Vec::new()),
        })
    }

    fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for EchoSummarizer {
    async fn generate(&self, request: GenerationRequest) -> Result<Message> {
        if self.fail {
            return Err(Error::Provider("model unavailable".to_string()));
        }

        let input = request.messages[0].text().into_owned();
        self.inputs.lock().unwrap().push(input.clone());
        Ok(Message::assistant(format!("Summary: {}", input)))
    }

    async fn generate_structured(
        &self,
        _request: GenerationRequest,
        _schema: &OutputSchema,
    ) -> Result<Value> {
        Err(Error::Provider("summarizer does not produce structured output".to_string()))
    }
}

struct FakeLoader {
    text: Option<String>,
}

#[async_trait]
impl DocumentLoader for FakeLoader {
    async fn load(&self, _bytes: &[u8], _mime_type: &str) -> Result<String> {
        self.text
            .clone()
            .ok_or_else(|| Error::Extraction("unreadable document".to_string()))
    }
}

fn loader(text: Option<&str>) -> Arc<FakeLoader> {
    Arc::new(FakeLoader {
        text: text.map(str::to_string),
    })
}

fn request_with_pdf(text: &str) -> Message {
    Message::Human(MessageBody {
        content: MessageContent::Blocks(vec![
            ContentBlock::Text {
                text: text.to_string(),
            },
            ContentBlock::File {
                mime_type: "application/pdf".to_string(),
                // "%PDF"
                data: "JVBERg==".to_string(),
            },
        ]),
        ..Default::default()
    })
}

fn john_smith_detected() -> Value {
    json!({
        "piiFound": true,
        "items": [
            {"category": "name", "value": "John Smith", "replacement": "Alex Doe", "startChar": 0, "endChar": 9},
            {"category": "email", "value": "john@smith.io", "replacement": "alex@doe.net", "startChar": 0, "endChar": 12}
        ]
    })
}

fn answer(state: &PipelineState) -> String {
    match state.messages.last() {
        Some(message @ Message::Assistant(_)) => message.text().into_owned(),
        other => panic!("expected an assistant answer, got {:?}", other),
    }
}

#[tokio::test]
async fn test_summary_never_sees_detected_values() {
    let detector = FakeDetector::returning(john_smith_detected());
    let summarizer = EchoSummarizer::new();
    let pipeline = DocumentPipeline::new(
        loader(Some("Lease signed by John Smith, contact john@smith.io.")),
        detector.clone(),
        summarizer.clone(),
    );

    let state = pipeline
        .run(vec![request_with_pdf("Summarize the lease for JOHN SMITH")])
        .await
        .unwrap();

    let inputs = summarizer.inputs();
    assert_eq!(inputs.len(), 1);
    assert!(!inputs[0].to_lowercase().contains("john smith"));
    assert!(!inputs[0].contains("john@smith.io"));
    assert!(inputs[0].contains("Alex Doe"));
    assert!(inputs[0].contains("<document>"));

    let answer = answer(&state);
    assert!(answer.contains("Lease signed by John Smith, contact john@smith.io."));
    assert!(!answer.contains("Alex Doe"));
    assert_eq!(state.messages.len(), 2);
    assert_eq!(detector.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_extraction_failure_still_answers() {
    let detector = FakeDetector::returning(json!({"piiFound": false, "items": []}));
    let pipeline = DocumentPipeline::new(loader(None), detector.clone(), EchoSummarizer::new());

    let state = pipeline
        .run(vec![request_with_pdf("Summarize please")])
        .await
        .unwrap();

    assert!(state.document.is_none());
    assert_eq!(
        detector.inputs.lock().unwrap()[0],
        "<user>\nSummarize please\n</user>"
    );
    assert_eq!(answer(&state), "Summary: <user>\nSummarize please\n</user>");
}

#[tokio::test]
async fn test_detection_failure_still_answers() {
    let summarizer = EchoSummarizer::new();
    let pipeline = DocumentPipeline::new(
        loader(None),
        FakeDetector::failing(),
        summarizer.clone(),
    );

    let state = pipeline
        .run(vec![Message::human("Note for John Smith")])
        .await
        .unwrap();

    assert_eq!(state.detection, Some(DetectionResult::none()));
    assert_eq!(summarizer.inputs()[0], "<user>\nNote for John Smith\n</user>");
    assert_eq!(answer(&state), "Summary: <user>\nNote for John Smith\n</user>");
}

#[tokio::test]
async fn test_generation_failure_aborts() {
    let pipeline = DocumentPipeline::new(
        loader(None),
        FakeDetector::returning(john_smith_detected()),
        EchoSummarizer::failing(),
    );

    let result = pipeline.run(vec![Message::human("Note for John Smith")]).await;

    assert!(matches!(result, Err(Error::Generation(_))));
}

#[tokio::test]
async fn test_reuse_mode_skips_detection_call() {
    let detector = FakeDetector::returning(json!({"piiFound": false, "items": []}));
    let summarizer = EchoSummarizer::new();
    let pipeline = DocumentPipeline::new(loader(None), detector.clone(), summarizer.clone());

    let mut state = PipelineState::new(vec![Message::human("Note for John Smith")]);
    state.detection = Some(DetectionResult::with_items(vec![PiiItem::new(
        "name",
        "John Smith",
        "Alex Doe",
    )]));

    let state = pipeline.run_state(state).await.unwrap();

    assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
    assert_eq!(summarizer.inputs()[0], "<user>\nNote for Alex Doe\n</user>");
    assert_eq!(answer(&state), "Summary: <user>\nNote for John Smith\n</user>");
}

#[tokio::test]
async fn test_always_mode_detects_again() {
    let detector = FakeDetector::returning(john_smith_detected());
    let pipeline = DocumentPipeline::new(loader(None), detector.clone(), EchoSummarizer::new())
        .with_config(PipelineConfig {
            detection_mode: DetectionMode::Always,
            ..Default::default()
        });

    let mut state = PipelineState::new(vec![Message::human("Note for John Smith")]);
    state.detection = Some(DetectionResult::none());

    let state = pipeline.run_state(state).await.unwrap();

    assert_eq!(detector.calls.load(Ordering::SeqCst), 1);
    assert!(state.detection.unwrap().pii_found);
}

#[tokio::test]
async fn test_concurrent_runs_share_one_pipeline() {
    let pipeline = Arc::new(DocumentPipeline::new(
        loader(None),
        FakeDetector::returning(john_smith_detected()),
        EchoSummarizer::new(),
    ));

    let first = tokio::spawn({
        let pipeline = pipeline.clone();
        async move { pipeline.run(vec![Message::human("First: John Smith")]).await }
    });
    let second = tokio::spawn({
        let pipeline = pipeline.clone();
        async move { pipeline.run(vec![Message::human("Second: john@smith.io")]).await }
    });

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    assert_eq!(answer(&first), "Summary: <user>\nFirst: John Smith\n</user>");
    assert_eq!(answer(&second), "Summary: <user>\nSecond: john@smith.io\n</user>");
}

#[test]
fn test_unsupported_message_kind_is_rejected() {
    let result: std::result::Result<Vec<Message>, _> = serde_json::from_value(json!([
        {"type": "human", "content": "hello"},
        {"type": "developer", "content": "debug"}
    ]));

    let err = result.unwrap_err();
    assert!(err.to_string().contains("Unsupported message kind: developer"));
}
