//! helm-message - the Conversation Manager (§4.2).
//!
//! Owns the bounded, role-tagged message log the Step Loop reads from and
//! appends to every step: token accounting, the ephemeral one-shot
//! lifecycle, sensitive-value redaction, the two-tier compaction policy
//! (local image-stripping/summary-placeholder pass plus an LLM-assisted
//! pass), the structured history description, and JSON snapshotting.
//!
//! # Module Structure
//!
//! - [`conversation`] - `ConversationManager`, the public contract
//! - [`compaction`] - basic compaction pass + LLM-compaction helpers
//! - [`history`] - `ConversationEntry` and history-description rendering
//! - [`redaction`] - sensitive-value masking
//! - [`persistence`] - `ConversationManagerState` snapshot shape
//! - [`error`] - persistence error types

pub mod compaction;
pub mod conversation;
pub mod error;
pub mod history;
pub mod persistence;
pub mod redaction;

pub use conversation::ConversationManager;
pub use error::ConversationError;
pub use error::Result;
pub use history::ConversationEntry;
pub use persistence::ConversationManagerState;
pub use persistence::PersistedMessage;
pub use redaction::MaskedValue;
pub use redaction::redact_text;
