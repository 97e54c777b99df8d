//! Rule-based placeholder redaction

use crate::placeholder::{RedactionMap, placeholder_token};
use crate::rules::RuleSet;
use regex::Captures;
use std::borrow::Cow;
use std::sync::Arc;

/// Trait for redacting PII from text
pub trait Redactor: Send + Sync {
    /// Replace detected values with placeholders, recording originals in `map`.
    ///
    /// Returns the input borrowed when nothing matched.
    fn redact<'a>(&self, text: &'a str, map: &mut RedactionMap) -> Cow<'a, str>;

    /// Whether redaction can never change any text
    fn is_noop(&self) -> bool;
}

/// Redactor replacing rule matches with `[REDACTED_<CATEGORY>_<id>]`
#[derive(Debug, Clone)]
pub struct PlaceholderRedactor {
    rules: Arc<RuleSet>,
}

impl PlaceholderRedactor {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

impl Default for PlaceholderRedactor {
    fn default() -> Self {
        Self::new(Arc::new(RuleSet::default()))
    }
}

impl Redactor for PlaceholderRedactor {
    fn redact<'a>(&self, text: &'a str, map: &mut RedactionMap) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(text);

        // Rules run sequentially over the text produced by the previous rule
        for rule in self.rules.iter() {
            let next = match rule.regex().replace_all(&current, |caps: &Captures<'_>| {
                let id = map.record(&caps[0]);
                placeholder_token(rule.category(), &id)
            }) {
                Cow::Borrowed(_) => None,
                Cow::Owned(replaced) => Some(replaced),
            };

            if let Some(replaced) = next {
                current = Cow::Owned(replaced);
            }
        }

        current
    }

    fn is_noop(&self) -> bool {
        self.rules.is_empty()
    }
}
