//! Persisted conversation snapshots (§6 Process surface:
//! `ConversationManagerState`).

use serde::Deserialize;
use serde::Serialize;

use crate::history::ConversationEntry;

/// One flattened message in a persisted snapshot: images become a text
/// placeholder, since the persistence format never round-trips them (§4.2
/// Persistence).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedMessage {
    pub role: helm_protocol::Role,
    pub content: String,
    pub is_compactable: bool,
    pub token_estimate: i64,
    pub step: Option<i64>,
    pub category: Option<helm_protocol::MessageCategory>,
}

/// A serialisable snapshot of a [`crate::conversation::ConversationManager`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationManagerState {
    pub system_prompt: Option<String>,
    pub messages: Vec<PersistedMessage>,
    pub history_items: Vec<ConversationEntry>,
    pub current_step: i64,
}
