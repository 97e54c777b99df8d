//! Tests for by-value redaction and restoration

use super::*;
use serde_json::json;

fn detection(items: &[(&str, &str, &str)]) -> DetectionResult {
    DetectionResult::with_items(
        items
            .iter()
            .map(|(category, value, replacement)| PiiItem::new(*category, *value, *replacement))
            .collect(),
    )
}

#[test]
fn test_redact_and_restore_by_value() {
    let result = detection(&[
        ("name", "Jane Roe", "Mary Major"),
        ("email", "jane@example.com", "mary@sample.org"),
    ]);

    let redacted =
        redact_by_value("Jane Roe (jane@example.com) signed the lease.", &result).unwrap();
    assert_eq!(redacted, "Mary Major (mary@sample.org) signed the lease.");

    let restored = restore_by_value(&redacted, &result).unwrap();
    assert_eq!(restored, "Jane Roe (jane@example.com) signed the lease.");
}

#[test]
fn test_every_occurrence_any_case_is_replaced() {
    let result = detection(&[("name", "John Smith", "Alex Doe")]);

    let redacted = redact_by_value("John Smith called today. JOHN SMITH again.", &result).unwrap();
    assert_eq!(redacted, "Alex Doe called today. Alex Doe again.");

    let restored = restore_by_value("Alex Doe said hi", &result).unwrap();
    assert_eq!(restored, "John Smith said hi");
}

#[test]
fn test_values_are_matched_literally() {
    let result = detection(&[("code", "a.b(c)", "x")]);

    let redacted = redact_by_value("axb(c) and a.b(c)", &result).unwrap();
    assert_eq!(redacted, "axb(c) and x");
}

#[test]
fn test_replacement_is_inserted_literally() {
    let result = detection(&[("amount", "100 EUR", "$1 USD")]);

    let redacted = redact_by_value("pay 100 EUR", &result).unwrap();
    assert_eq!(redacted, "pay $1 USD");
}

#[test]
fn test_no_pii_leaves_text_untouched() {
    let result = DetectionResult::none();

    let redacted = redact_by_value("Jane Roe", &result).unwrap();
    assert!(matches!(redacted, Cow::Borrowed("Jane Roe")));

    let restored = restore_by_value("Mary Major", &result).unwrap();
    assert!(matches!(restored, Cow::Borrowed("Mary Major")));
}

#[test]
fn test_items_apply_in_list_order() {
    // The second item only sees the output of the first
    let result = detection(&[("name", "Ann", "Bea"), ("name", "Bea", "Cid")]);

    let redacted = redact_by_value("Ann", &result).unwrap();
    assert_eq!(redacted, "Cid");
}

#[test]
fn test_normalized_enforces_invariants() {
    let inconsistent = DetectionResult {
        pii_found: false,
        items: vec![PiiItem::new("name", "Jane", "Mary")],
    };
    assert_eq!(inconsistent.normalized(), DetectionResult::none());

    let flagged = DetectionResult {
        pii_found: true,
        items: vec![PiiItem::new("name", "", "Mary")],
    };
    let normalized = flagged.normalized();
    assert!(!normalized.pii_found);
    assert!(normalized.items.is_empty());

    let unflagged = detection(&[("name", "Jane", "Mary")]);
    assert!(unflagged.pii_found);
    assert_eq!(unflagged.items.len(), 1);
}

#[test]
fn test_deserialize_detection_payload() {
    let payload = json!({
        "piiFound": true,
        "items": [
            {
                "category": "email",
                "value": "jane@example.com",
                "replacement": "mary@sample.org",
                "startChar": 14,
                "lastChar": 29
            },
            {
                "category": "name",
                "value": "Jane",
                "replacement": "Mary"
            }
        ]
    });

    let result: DetectionResult = serde_json::from_value(payload).unwrap();

    assert!(result.pii_found);
    assert_eq!(result.items[0].start_char, 14);
    assert_eq!(result.items[0].end_char, 29);
    assert_eq!(result.items[1].start_char, 0);
}

#[test]
fn test_serializes_camel_case() {
    let result = detection(&[("name", "Jane", "Mary")]);
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["piiFound"], json!(true));
    assert_eq!(value["items"][0]["endChar"], json!(0));
}

#[test]
fn test_json_schema_requires_contract_fields() {
    let schema = DetectionResult::json_schema();

    assert_eq!(schema["required"], json!(["piiFound", "items"]));
    assert_eq!(
        schema["properties"]["items"]["items"]["properties"]["replacement"]["type"],
        json!("string")
    );
}
