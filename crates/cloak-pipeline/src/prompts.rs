//! Built-in system prompts

/// Prompt for the model-based PII detection step
pub const DETECT_PII: &str = "\
You detect personally identifiable information (PII) in text.

The input holds a user request inside <user> tags and, optionally, a document \
inside <document> tags. Report every PII value found in either part: names, \
email addresses, phone numbers, postal addresses, IP addresses, usernames and \
account ids, government ids, financial numbers, dates of birth, locations and \
anything else that identifies a person.

For each value report:
- category: short label such as name, email or location
- value: the text exactly as it appears, without any change
- replacement: a realistic made-up value of the same category
- startChar and endChar: character positions of the value in the input

Use the same replacement for repeated occurrences of the same value and never \
reuse a replacement for two different values. When nothing is found, report \
piiFound false with an empty item list.";

/// Prompt for the summarization step
pub const SUMMARIZE: &str = "\
You summarize documents and requests.

Write a summary that covers the key points and main ideas of the text in a \
concise, readable form. Keep the details and examples that support those \
points and leave out repetition. Scale the length of the summary to the \
length and complexity of the text.

Names, contact details and other personal values in the text are \
placeholders. Reproduce them exactly as written when they are relevant.";

/// Default system prompt for conversations through the redaction middleware
pub const CONVERSATION: &str = "\
You are a careful assistant working on confidential material.

Some values in the conversation appear as tokens of the form \
[REDACTED_<CATEGORY>_<id>]. Treat each token as the value it stands for and \
copy it verbatim whenever you need to refer to that value. Never invent, \
alter or expand such tokens.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_mention_contract_fields() {
        for field in ["category", "value", "replacement", "startChar", "endChar", "piiFound"] {
            assert!(DETECT_PII.contains(field), "missing {}", field);
        }
        assert!(CONVERSATION.contains("[REDACTED_"));
    }
}
