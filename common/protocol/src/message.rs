//! Message and conversation-log data types shared across the agent workspace.

use serde::Deserialize;
use serde::Serialize;

/// Who produced a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One part of a message's content.
///
/// A message's content is either a plain string or an ordered sequence of
/// these parts; images contribute a fixed token approximation rather than
/// being measured, since the core never actually decodes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Image { base64: String, mime: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(base64: impl Into<String>, mime: impl Into<String>) -> Self {
        Self::Image {
            base64: base64.into(),
            mime: mime.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image { .. } => None,
        }
    }
}

/// The body of a [`Message`]: either a plain string or a list of parts.
///
/// A plain string is the common case (state/result/user messages); the part
/// list form is used once a message carries an image alongside text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Render the content as a flat string, dropping image parts.
    ///
    /// Used for persistence (§6 Process surface) and for the LLM-compaction
    /// transcript, neither of which round-trips images.
    pub fn flatten_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(ContentPart::as_text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn has_image(&self) -> bool {
        match self {
            Self::Text(_) => false,
            Self::Parts(parts) => parts.iter().any(ContentPart::is_image),
        }
    }

    /// Returns a copy of this content with every image part removed.
    ///
    /// A plain-string content is returned unchanged: only the part-list form
    /// can carry images in the first place.
    pub fn without_images(&self) -> Self {
        match self {
            Self::Text(_) => self.clone(),
            Self::Parts(parts) => {
                Self::Parts(parts.iter().filter(|p| !p.is_image()).cloned().collect())
            }
        }
    }
}

/// An immutable message as delivered to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn new(role: Role, content: MessageContent) -> Self {
        Self { role, content }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, MessageContent::text(text))
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, MessageContent::text(text))
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, MessageContent::text(text))
    }
}

/// The category a [`TrackedMessage`] was added as, used for history rendering
/// and for deciding compaction eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    System,
    State,
    ActionResult,
    Assistant,
    User,
    CompactionSummary,
}

impl MessageCategory {
    /// The history-description prefix for this category (§4.2 History description).
    pub fn history_prefix(&self) -> &'static str {
        match self {
            Self::System => "System",
            Self::State => "State",
            Self::ActionResult => "Result",
            Self::Assistant => "Agent",
            Self::User => "User",
            Self::CompactionSummary => "compaction_summary",
        }
    }
}

/// A [`Message`] plus the bookkeeping the Conversation Manager needs: token
/// accounting, compaction eligibility, and the ephemeral one-shot lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedMessage {
    pub message: Message,
    pub compactable: bool,
    pub token_estimate: i64,
    pub step: Option<i64>,
    pub category: MessageCategory,
    pub ephemeral: bool,
    pub ephemeral_read: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub added_at: chrono::DateTime<chrono::Utc>,
}

/// Fixed token contribution of a single image part (§3 Invariants).
pub const IMAGE_TOKEN_ESTIMATE: i64 = 1000;

/// Estimate the token cost of a message's content: `ceil(len / 4)` per text
/// part, `IMAGE_TOKEN_ESTIMATE` per image part.
pub fn estimate_tokens(content: &MessageContent) -> i64 {
    match content {
        MessageContent::Text(s) => text_tokens(s),
        MessageContent::Parts(parts) => parts
            .iter()
            .map(|p| match p {
                ContentPart::Text { text } => text_tokens(text),
                ContentPart::Image { .. } => IMAGE_TOKEN_ESTIMATE,
            })
            .sum(),
    }
}

fn text_tokens(s: &str) -> i64 {
    (s.len() as i64).div_ceil(4)
}

impl TrackedMessage {
    pub fn new(message: Message, category: MessageCategory, step: Option<i64>) -> Self {
        let token_estimate = estimate_tokens(&message.content);
        Self {
            message,
            compactable: !matches!(category, MessageCategory::System),
            token_estimate,
            step,
            category,
            ephemeral: false,
            ephemeral_read: false,
            added_at: chrono::Utc::now(),
        }
    }

    pub fn ephemeral(message: Message, step: Option<i64>) -> Self {
        let mut tracked = Self::new(message, MessageCategory::User, step);
        tracked.ephemeral = true;
        tracked.compactable = false;
        tracked
    }

    /// Recompute `token_estimate` after mutating `message.content` in place.
    pub fn refresh_token_estimate(&mut self) {
        self.token_estimate = estimate_tokens(&self.message.content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_token_estimate_rounds_up() {
        assert_eq!(text_tokens(""), 0);
        assert_eq!(text_tokens("ab"), 1);
        assert_eq!(text_tokens("abcd"), 1);
        assert_eq!(text_tokens("abcde"), 2);
    }

    #[test]
    fn image_part_contributes_fixed_estimate() {
        let content = MessageContent::Parts(vec![ContentPart::image("AAAA", "image/png")]);
        assert_eq!(estimate_tokens(&content), IMAGE_TOKEN_ESTIMATE);
    }

    #[test]
    fn without_images_drops_only_image_parts() {
        let content = MessageContent::Parts(vec![
            ContentPart::text("hello"),
            ContentPart::image("AAAA", "image/png"),
        ]);
        let stripped = content.without_images();
        assert!(!stripped.has_image());
        assert_eq!(stripped.flatten_text(), "hello");
    }

    #[test]
    fn plain_text_content_has_no_image() {
        let content = MessageContent::text("hi");
        assert!(!content.has_image());
        assert_eq!(content.without_images(), content);
    }

    #[test]
    fn tracked_message_system_is_not_compactable() {
        let tracked = TrackedMessage::new(Message::system("you are an agent"), MessageCategory::System, None);
        assert!(!tracked.compactable);
    }

    #[test]
    fn ephemeral_message_starts_unread() {
        let tracked = TrackedMessage::ephemeral(Message::user("nudge"), Some(3));
        assert!(tracked.ephemeral);
        assert!(!tracked.ephemeral_read);
        assert!(!tracked.compactable);
    }

    #[test]
    fn refresh_token_estimate_reflects_mutation() {
        let mut tracked = TrackedMessage::new(
            Message::new(
                Role::User,
                MessageContent::Parts(vec![ContentPart::image("AAAA", "image/png")]),
            ),
            MessageCategory::State,
            Some(1),
        );
        assert_eq!(tracked.token_estimate, IMAGE_TOKEN_ESTIMATE);
        tracked.message.content = tracked.message.content.without_images();
        tracked.refresh_token_estimate();
        assert_eq!(tracked.token_estimate, 0);
    }
}
