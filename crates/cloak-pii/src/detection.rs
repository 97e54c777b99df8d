//! Detection contract for model-based PII detection
//!
//! A text-understanding capability reports every PII value it found together
//! with a synthetic stand-in of the same category. Redaction swaps values for
//! stand-ins; restoration swaps them back. Matching is by literal value, never
//! by offset.

use crate::PiiError;
use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A single detected PII value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiiItem {
    /// Free-text category label (email, name, location, ...)
    pub category: String,

    /// Exact text as it appears in the source
    pub value: String,

    /// Synthetic value of the same category
    pub replacement: String,

    /// Offset of the first character in the source (informational)
    #[serde(default)]
    pub start_char: i64,

    /// Offset of the last character in the source (informational)
    #[serde(default, alias = "lastChar")]
    pub end_char: i64,
}

impl PiiItem {
    pub fn new(
        category: impl Into<String>,
        value: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            value: value.into(),
            replacement: replacement.into(),
            start_char: 0,
            end_char: 0,
        }
    }
}

/// Result of a detection call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub pii_found: bool,

    #[serde(default)]
    pub items: Vec<PiiItem>,
}

impl DetectionResult {
    /// No PII found
    pub fn none() -> Self {
        Self::default()
    }

    /// Result holding `items`; `pii_found` follows from them
    pub fn with_items(items: Vec<PiiItem>) -> Self {
        Self {
            pii_found: !items.is_empty(),
            items,
        }
        .normalized()
    }

    /// Enforce the contract invariants.
    ///
    /// Items with an empty value are dropped, `pii_found = false` clears the
    /// items and any remaining item sets `pii_found`.
    pub fn normalized(mut self) -> Self {
        if !self.pii_found {
            self.items.clear();
        }
        self.items.retain(|item| !item.value.is_empty());
        self.pii_found = !self.items.is_empty();
        self
    }

    /// JSON schema handed to structured-output capabilities
    pub fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "piiFound": {
                    "type": "boolean",
                    "description": "Whether any PII was found"
                },
                "items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "category": {
                                "type": "string",
                                "description": "The category of the item (email, name, location, etc.)"
                            },
                            "value": {
                                "type": "string",
                                "description": "The exact text value found in the original text"
                            },
                            "replacement": {
                                "type": "string",
                                "description": "An equivalent replacement value for the text value found"
                            },
                            "startChar": {
                                "type": "number",
                                "description": "The index of the first character for this item in the original text"
                            },
                            "endChar": {
                                "type": "number",
                                "description": "The index of the last character for this item in the original text"
                            }
                        },
                        "required": ["category", "value", "replacement", "startChar", "endChar"]
                    }
                }
            },
            "required": ["piiFound", "items"]
        })
    }
}

/// Replace every detected value with its stand-in.
///
/// Items apply in list order, each over the output of the previous one.
pub fn redact_by_value<'a>(
    text: &'a str,
    detection: &DetectionResult,
) -> Result<Cow<'a, str>, PiiError> {
    if !detection.pii_found {
        return Ok(Cow::Borrowed(text));
    }

    substitute(
        text,
        detection
            .items
            .iter()
            .map(|item| (item.value.as_str(), item.replacement.as_str())),
    )
}

/// Replace every stand-in with the detected value it replaced
pub fn restore_by_value<'a>(
    text: &'a str,
    detection: &DetectionResult,
) -> Result<Cow<'a, str>, PiiError> {
    if !detection.pii_found {
        return Ok(Cow::Borrowed(text));
    }

    substitute(
        text,
        detection
            .items
            .iter()
            .map(|item| (item.replacement.as_str(), item.value.as_str())),
    )
}

fn substitute<'a, 'p>(
    text: &'a str,
    pairs: impl Iterator<Item = (&'p str, &'p str)>,
) -> Result<Cow<'a, str>, PiiError> {
    let mut current = Cow::Borrowed(text);

    for (from, to) in pairs {
        if from.is_empty() {
            continue;
        }

        let next = match literal_regex(from)?.replace_all(&current, NoExpand(to)) {
            Cow::Borrowed(_) => None,
            Cow::Owned(replaced) => Some(replaced),
        };

        if let Some(replaced) = next {
            current = Cow::Owned(replaced);
        }
    }

    Ok(current)
}

/// Case-insensitive regex matching `literal` and nothing else
fn literal_regex(literal: &str) -> Result<Regex, PiiError> {
    RegexBuilder::new(&regex::escape(literal))
        .case_insensitive(true)
        .build()
        .map_err(|source| PiiError::InvalidPattern {
            name: "literal value".to_string(),
            source,
        })
}

#[cfg(test)]
mod tests;
