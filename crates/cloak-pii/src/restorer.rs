//! Placeholder restoration

use crate::PiiError;
use crate::placeholder::{PLACEHOLDER_PATTERN, RedactionMap};
use regex::Captures;
use serde::{Serialize, de::DeserializeOwned};
use std::borrow::Cow;

/// Result of restoring placeholders in a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restoration<'a> {
    pub text: Cow<'a, str>,

    /// Whether at least one placeholder was substituted
    pub changed: bool,
}

/// Replace every known placeholder in `text` with its original value.
///
/// Placeholders whose id is not in `map` are left as they are.
pub fn restore<'a>(text: &'a str, map: &RedactionMap) -> Restoration<'a> {
    if map.is_empty() {
        return Restoration {
            text: Cow::Borrowed(text),
            changed: false,
        };
    }

    let mut changed = false;
    let replaced = PLACEHOLDER_PATTERN.replace_all(text, |caps: &Captures<'_>| {
        match map.get(&caps[1]) {
            Some(original) => {
                changed = true;
                original.to_string()
            }
            None => caps[0].to_string(),
        }
    });

    if changed {
        Restoration {
            text: Cow::Owned(replaced.into_owned()),
            changed,
        }
    } else {
        Restoration {
            text: Cow::Borrowed(text),
            changed,
        }
    }
}

/// Restore placeholders inside a structured payload.
///
/// The payload is serialized to JSON, restored as text and parsed back.
/// Returns `Ok(None)` when no placeholder was substituted. A restored value
/// that breaks the JSON yields `PiiError::StructuredRestore`.
pub fn restore_json<T>(value: &T, map: &RedactionMap) -> Result<Option<T>, PiiError>
where
    T: Serialize + DeserializeOwned,
{
    let serialized = serde_json::to_string(value)?;
    let restored = restore(&serialized, map);

    if !restored.changed {
        return Ok(None);
    }

    Ok(Some(serde_json::from_str(&restored.text)?))
}
