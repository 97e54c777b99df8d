//! Placeholder tokens and the redaction map

use once_cell::sync::Lazy;
use rand::{Rng, distr::Alphanumeric};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Length of generated token ids
pub const TOKEN_ID_LEN: usize = 12;

/// Matches `[REDACTED_<CATEGORY>_<id>]`; group 1 is the id
pub(crate) static PLACEHOLDER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[REDACTED_[A-Z0-9_-]+_([A-Za-z0-9]+)\]").expect("placeholder pattern is valid")
});

/// Format a placeholder token
pub fn placeholder_token(category: &str, id: &str) -> String {
    format!("[REDACTED_{}_{}]", category, id)
}

/// Token id → original value, scoped to one pipeline invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedactionMap {
    entries: HashMap<String, String>,
}

impl RedactionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `original` under a fresh id and return the id
    pub fn record(&mut self, original: &str) -> String {
        loop {
            let id = generate_id();
            if !self.entries.contains_key(&id) {
                self.entries.insert(id.clone(), original.to_string());
                return id;
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn generate_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_ID_LEN)
        .map(char::from)
        .collect()
}
