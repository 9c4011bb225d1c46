//! Sensitive-value redaction (§4.2 "Sensitive-value redaction").
//!
//! Configured `(key, value)` pairs have every occurrence of `value` in a
//! message's text parts replaced with `<KEY>`, so masked secrets never
//! reach the model even after compaction rewrites a message's body.

use helm_protocol::ContentPart;
use helm_protocol::Message;
use helm_protocol::MessageContent;

/// A single masked value: the placeholder is derived from `key` upper-cased.
#[derive(Debug, Clone)]
pub struct MaskedValue {
    pub key: String,
    pub value: String,
}

impl MaskedValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    fn placeholder(&self) -> String {
        format!("<{}>", self.key.to_uppercase())
    }
}

/// Redact every configured masked value out of a message's text, returning a
/// new [`Message`]. Image parts are passed through untouched.
pub fn redact_message(message: &Message, masked: &[MaskedValue]) -> Message {
    if masked.is_empty() {
        return message.clone();
    }
    let content = match &message.content {
        MessageContent::Text(text) => MessageContent::Text(redact_text(text, masked)),
        MessageContent::Parts(parts) => MessageContent::Parts(
            parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => ContentPart::text(redact_text(text, masked)),
                    ContentPart::Image { .. } => part.clone(),
                })
                .collect(),
        ),
    };
    Message::new(message.role, content)
}

/// Redact every configured masked value out of a free-standing string, used
/// for command results before they're folded into a summary message (§4.4
/// "mask sensitive data in extractedContent and error").
pub fn redact_text(text: &str, masked: &[MaskedValue]) -> String {
    let mut out = text.to_string();
    for value in masked {
        if value.value.is_empty() {
            continue;
        }
        let pattern = regex::escape(&value.value);
        if let Ok(re) = regex::Regex::new(&pattern) {
            out = re.replace_all(&out, value.placeholder()).into_owned();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use helm_protocol::Role;

    #[test]
    fn redacts_exact_string_occurrences() {
        let masked = vec![MaskedValue::new("api_key", "sk-secret-123")];
        let out = redact_text("key is sk-secret-123 here", &masked);
        assert_eq!(out, "key is <API_KEY> here");
    }

    #[test]
    fn regex_metacharacters_in_value_are_escaped() {
        let masked = vec![MaskedValue::new("token", "a.b*c")];
        let out = redact_text("value=a.b*c end", &masked);
        assert_eq!(out, "value=<TOKEN> end");
        // A literal value containing metacharacters must not match unrelated text.
        let unrelated = redact_text("aXbYc", &masked);
        assert_eq!(unrelated, "aXbYc");
    }

    #[test]
    fn redact_message_leaves_images_untouched() {
        let masked = vec![MaskedValue::new("secret", "shh")];
        let message = Message::new(
            Role::User,
            MessageContent::Parts(vec![
                ContentPart::text("shh is the password"),
                ContentPart::image("AAAA", "image/png"),
            ]),
        );
        let redacted = redact_message(&message, &masked);
        assert_eq!(
            redacted.content.flatten_text(),
            "<SECRET> is the password"
        );
        assert!(redacted.content.has_image());
    }
}
