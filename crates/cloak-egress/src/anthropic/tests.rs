use super::*;
use serde_json::json;

fn config() -> AnthropicConfig {
    AnthropicConfig::new("test-key", "claude-sonnet-4-5")
}

fn request_json(request: &GenerationRequest) -> serde_json::Value {
    serde_json::to_value(to_anthropic_request(request, &config()).unwrap()).unwrap()
}

#[test]
fn test_config_builder() {
    let config = config()
        .with_base_url("http://localhost:9000")
        .with_api_version("2024-01-01")
        .with_max_tokens(512)
        .with_temperature(None);

    assert_eq!(config.base_url, "http://localhost:9000");
    assert_eq!(config.api_version, "2024-01-01");
    assert_eq!(config.max_tokens, 512);
    assert!(config.temperature.is_none());
}

#[test]
fn test_connector_rejects_empty_api_key() {
    let result = AnthropicConnector::new(AnthropicConfig::new("  ", "claude-sonnet-4-5"));
    assert!(matches!(result, Err(EgressError::ConfigError(_))));
}

#[test]
fn test_system_messages_fold_into_system_prompt() {
    let request = GenerationRequest::new(vec![
        Message::system("Answer briefly."),
        Message::human("Hi"),
    ])
    .with_system("You are careful.");

    let body = request_json(&request);

    assert_eq!(body["system"], "You are careful.\n\nAnswer briefly.");
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["messages"][0], json!({"role": "user", "content": "Hi"}));
    assert_eq!(body["model"], "claude-sonnet-4-5");
    assert_eq!(body["max_tokens"], 4096);
    assert!(body.get("tools").is_none());
}

#[test]
fn test_request_without_conversation_is_rejected() {
    let request = GenerationRequest::new(vec![Message::system("Only a prompt")]);
    let result = to_anthropic_request(&request, &config());
    assert!(matches!(result, Err(EgressError::ConfigError(_))));
}

#[test]
fn test_file_blocks_become_document_and_image_sources() {
    let human = Message::Human(MessageBody {
        content: MessageContent::Blocks(vec![
            ContentBlock::Text {
                text: "Look at these".to_string(),
            },
            ContentBlock::File {
                mime_type: "application/pdf".to_string(),
                data: "JVBERg==".to_string(),
            },
            ContentBlock::File {
                mime_type: "image/png".to_string(),
                data: "iVBORw==".to_string(),
            },
            ContentBlock::File {
                mime_type: "application/zip".to_string(),
                data: "UEsD".to_string(),
            },
            ContentBlock::Image {
                url: "https://example.com/cat.jpg".to_string(),
            },
        ]),
        ..Default::default()
    });

    let body = request_json(&GenerationRequest::new(vec![human]));
    let blocks = body["messages"][0]["content"].as_array().unwrap();

    assert_eq!(blocks.len(), 4);
    assert_eq!(blocks[0], json!({"type": "text", "text": "Look at these"}));
    assert_eq!(
        blocks[1],
        json!({"type": "document", "source": {"type": "base64", "media_type": "application/pdf", "data": "JVBERg=="}})
    );
    assert_eq!(blocks[2]["type"], "image");
    assert_eq!(blocks[2]["source"]["media_type"], "image/png");
    assert_eq!(
        blocks[3],
        json!({"type": "image", "source": {"type": "url", "url": "https://example.com/cat.jpg"}})
    );
}

#[test]
fn test_tool_calls_and_results() {
    let assistant = Message::Assistant(AssistantMessage {
        body: MessageBody {
            content: MessageContent::Text("Checking".to_string()),
            ..Default::default()
        },
        tool_calls: vec![
            ToolCall {
                id: Some("toolu_abc".to_string()),
                name: "lookup".to_string(),
                args: json!({"q": "owner"}),
            },
            ToolCall {
                id: None,
                name: "lookup".to_string(),
                args: json!({"q": "tenant"}),
            },
        ],
    });

    let body = request_json(&GenerationRequest::new(vec![
        Message::human("Who owns it?"),
        assistant,
        Message::tool("Jane", "toolu_abc"),
    ]));
    let messages = body["messages"].as_array().unwrap();

    assert_eq!(messages[1]["role"], "assistant");
    let blocks = messages[1]["content"].as_array().unwrap();
    assert_eq!(blocks[0], json!({"type": "text", "text": "Checking"}));
    assert_eq!(
        blocks[1],
        json!({"type": "tool_use", "id": "toolu_abc", "name": "lookup", "input": {"q": "owner"}})
    );
    assert_eq!(blocks[2]["id"], "toolu_1");

    assert_eq!(messages[2]["role"], "user");
    assert_eq!(
        messages[2]["content"][0],
        json!({"type": "tool_result", "tool_use_id": "toolu_abc", "content": "Jane"})
    );
}

#[test]
fn test_response_conversion() {
    let response: AnthropicResponse = serde_json::from_value(json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "model": "claude-sonnet-4-5",
        "content": [
            {"type": "thinking", "thinking": "hmm", "signature": "sig"},
            {"type": "text", "text": "First"},
            {"type": "text", "text": "Second"},
            {"type": "tool_use", "id": "toolu_9", "name": "search", "input": {"q": "x"}}
        ],
        "stop_reason": "tool_use",
        "usage": {"input_tokens": 10, "output_tokens": 5}
    }))
    .unwrap();

    let message = from_anthropic_response(response);

    assert_eq!(message.id(), Some("msg_01"));
    assert_eq!(message.text(), "First\nSecond");
    assert_eq!(message.tool_calls().len(), 1);
    assert_eq!(message.tool_calls()[0].id.as_deref(), Some("toolu_9"));
    assert_eq!(message.tool_calls()[0].args, json!({"q": "x"}));
}

#[test]
fn test_response_without_usage() {
    let response: AnthropicResponse = serde_json::from_value(json!({
        "id": "msg_02",
        "model": "claude-sonnet-4-5",
        "content": [{"type": "text", "text": "ok"}],
        "stop_reason": null
    }))
    .unwrap();

    assert_eq!(response.usage.input_tokens, 0);
    assert_eq!(from_anthropic_response(response).text(), "ok");
}
