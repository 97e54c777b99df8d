//! Named detection rules

use crate::PiiError;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Pattern of the built-in email rule
pub const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";

static DEFAULT_EMAIL_RULE: Lazy<Rule> = Lazy::new(|| {
    Rule::compile(&RuleConfig::new("email", EMAIL_PATTERN))
        .expect("built-in email pattern is valid")
});

/// Serializable rule definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Unique rule name, also the source of the placeholder category
    pub name: String,

    /// Regex pattern (matched case-insensitively)
    pub pattern: String,
}

impl RuleConfig {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
        }
    }
}

/// A compiled rule
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    category: String,
    regex: Regex,
}

impl Rule {
    /// Compile a rule definition
    pub fn compile(config: &RuleConfig) -> Result<Self, PiiError> {
        if config.name.trim().is_empty() {
            return Err(PiiError::EmptyRuleName);
        }

        let category = category_label(&config.name);
        if category.is_empty() {
            return Err(PiiError::EmptyCategory(config.name.clone()));
        }

        let regex = RegexBuilder::new(&config.pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| PiiError::InvalidPattern {
                name: config.name.clone(),
                source,
            })?;

        Ok(Self {
            name: config.name.clone(),
            category,
            regex,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placeholder category label (uppercase, `[A-Z0-9_-]` only)
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

/// Derive a placeholder category from a rule name
pub fn category_label(name: &str) -> String {
    name.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Ordered set of compiled rules
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compile rule definitions, keeping their order
    pub fn new(configs: impl IntoIterator<Item = RuleConfig>) -> Result<Self, PiiError> {
        let mut seen = HashSet::new();
        let mut rules = Vec::new();

        for config in configs {
            let rule = Rule::compile(&config)?;
            if !seen.insert(rule.name.clone()) {
                return Err(PiiError::DuplicateRule(rule.name));
            }
            rules.push(rule);
        }

        Ok(Self { rules })
    }

    /// Build from `(name, pattern)` pairs
    pub fn from_pairs<N, P>(pairs: impl IntoIterator<Item = (N, P)>) -> Result<Self, PiiError>
    where
        N: Into<String>,
        P: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, pattern)| RuleConfig::new(name, pattern)),
        )
    }

    /// A rule set with no rules; redaction becomes a no-op
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Definitions of the rules, in order
    pub fn configs(&self) -> Vec<RuleConfig> {
        self.rules
            .iter()
            .map(|rule| RuleConfig::new(rule.name(), rule.pattern()))
            .collect()
    }
}

impl Default for RuleSet {
    /// Built-in rule set: a single `email` rule
    fn default() -> Self {
        Self {
            rules: vec![DEFAULT_EMAIL_RULE.clone()],
        }
    }
}
