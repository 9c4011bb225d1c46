//! The Conversation Manager (§4.2): an append-mostly, bounded, role-tagged
//! message log that serves a request-shaped message list to the model,
//! keeps a structured history for rendering, and owns both compaction
//! tiers.

use helm_config::CompactionConfig;
use helm_model::ModelCollaborator;
use helm_protocol::Message;
use helm_protocol::MessageCategory;
use helm_protocol::MessageContent;
use helm_protocol::Role;
use helm_protocol::TrackedMessage;
use helm_protocol::estimate_tokens;

use crate::compaction::basic_compact;
use crate::compaction::build_summarisation_transcript;
use crate::compaction::summary_placeholder_text;
use crate::compaction::verbatim_tail_count;
use crate::history::ConversationEntry;
use crate::persistence::ConversationManagerState;
use crate::persistence::PersistedMessage;
use crate::redaction::MaskedValue;
use crate::redaction::redact_message;

const SUMMARISER_SYSTEM_INSTRUCTION: &str = crate::compaction::SUMMARISER_SYSTEM_INSTRUCTION;
const DEFAULT_HISTORY_STEP_LIMIT: usize = 40;

/// Owns the full conversation state for one agent run. The Agent is the
/// sole owner and mutator (§5 Shared-resource policy): no concurrent
/// mutation is permitted.
pub struct ConversationManager {
    compaction: CompactionConfig,
    system_prompt: Option<String>,
    messages: Vec<TrackedMessage>,
    history: Vec<ConversationEntry>,
    current_step: i64,
    last_compaction_step: i64,
    masked_values: Vec<MaskedValue>,
}

impl ConversationManager {
    pub fn new(compaction: CompactionConfig) -> Self {
        Self {
            compaction,
            system_prompt: None,
            messages: Vec::new(),
            history: Vec::new(),
            current_step: 0,
            last_compaction_step: 0,
            masked_values: Vec::new(),
        }
    }

    /// Replace the single system message (§4.2 `setInstructionBuilder`).
    pub fn set_instruction_builder(&mut self, text: impl Into<String>) {
        self.system_prompt = Some(text.into());
    }

    /// The Step Loop calls this once per step so compaction cadence and
    /// history grouping stay keyed to the current step.
    pub fn set_current_step(&mut self, step: i64) {
        self.current_step = step;
    }

    pub fn add_masked_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.masked_values.push(MaskedValue::new(key, value));
    }

    pub fn add_state_message(
        &mut self,
        text: impl Into<String>,
        screenshot: Option<(String, String)>,
        step: Option<i64>,
    ) {
        let text = text.into();
        let has_screenshot = screenshot.is_some();
        let content = match screenshot {
            Some((base64, mime)) => MessageContent::Parts(vec![
                helm_protocol::ContentPart::text(text.clone()),
                helm_protocol::ContentPart::image(base64, mime),
            ]),
            None => MessageContent::text(text.clone()),
        };
        self.push_tracked(Message::new(Role::User, content), MessageCategory::State, step, &text, has_screenshot);
    }

    pub fn add_assistant_message(&mut self, text: impl Into<String>, step: Option<i64>) {
        let text = text.into();
        self.push_tracked(Message::assistant(text.clone()), MessageCategory::Assistant, step, &text, false);
    }

    pub fn add_command_result_message(&mut self, text: impl Into<String>, step: Option<i64>) {
        let text = text.into();
        self.push_tracked(Message::user(text.clone()), MessageCategory::ActionResult, step, &text, false);
    }

    pub fn add_user_message(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.push_tracked(Message::user(text.clone()), MessageCategory::User, None, &text, false);
    }

    /// Add a message that survives exactly one subsequent [`Self::get_messages`]
    /// call (§4.2 "Ephemeral lifecycle").
    pub fn add_ephemeral_message(&mut self, text: impl Into<String>, role: Role) {
        let message = Message::new(role, MessageContent::text(text.into()));
        self.messages.push(TrackedMessage::ephemeral(message, Some(self.current_step)));
    }

    fn push_tracked(
        &mut self,
        message: Message,
        category: MessageCategory,
        step: Option<i64>,
        summary_source: &str,
        has_screenshot: bool,
    ) {
        let step = step.unwrap_or(self.current_step);
        self.messages.push(TrackedMessage::new(message, category, Some(step)));
        self.history.push(ConversationEntry::new(
            step,
            category,
            summary_source,
            summary_source,
            has_screenshot,
        ));
    }

    /// Assemble the message list the model sees: system first (if set),
    /// running basic compaction first if over budget, with sensitive values
    /// redacted, then advance the ephemeral lifecycle.
    pub fn get_messages(&mut self) -> Vec<Message> {
        if self.estimate_total_tokens() > self.compaction.context_window_tokens {
            basic_compact(&mut self.messages, self.compaction.context_window_tokens);
        }

        let mut out = Vec::with_capacity(self.messages.len() + 1);
        if let Some(system) = &self.system_prompt {
            out.push(Message::system(system.clone()));
        }
        for tracked in &self.messages {
            out.push(redact_message(&tracked.message, &self.masked_values));
        }

        self.messages.retain(|m| !(m.ephemeral && m.ephemeral_read));
        for m in &mut self.messages {
            if m.ephemeral {
                m.ephemeral_read = true;
            }
        }

        out
    }

    pub fn estimate_total_tokens(&self) -> i64 {
        let system_tokens = self
            .system_prompt
            .as_ref()
            .map(|s| estimate_tokens(&MessageContent::text(s.clone())))
            .unwrap_or(0);
        system_tokens + self.messages.iter().map(|m| m.token_estimate).sum::<i64>()
    }

    /// Whether an LLM-compaction pass is due (§4.2 "LLM compaction").
    pub fn should_compact_with_llm(&self) -> bool {
        if self.compaction.llm_compaction_interval <= 0 {
            return false;
        }
        if self.current_step - self.last_compaction_step < self.compaction.llm_compaction_interval {
            return false;
        }
        let target = (self.compaction.context_window_tokens as f64
            * self.compaction.llm_compaction_target_fraction) as i64;
        self.estimate_total_tokens() > target
    }

    /// Run the LLM-assisted compaction pass. Returns `false` silently on
    /// any failure or when no model is available (§4.2, §7).
    pub async fn compact_with_llm(&mut self, model: Option<&dyn ModelCollaborator>) -> bool {
        if !self.should_compact_with_llm() {
            return false;
        }
        let Some(model) = model else {
            return false;
        };

        let tail = verbatim_tail_count(self.messages.len());
        let split = self.messages.len() - tail;
        if split == 0 {
            return false;
        }

        let transcript = build_summarisation_transcript(&self.messages[..split]);
        let last_step = self.messages[..split]
            .last()
            .and_then(|m| m.step)
            .unwrap_or(self.current_step);

        let request = helm_model::ModelRequest {
            messages: vec![Message::system(SUMMARISER_SYSTEM_INSTRUCTION), Message::user(transcript)],
            response_schema: serde_json::json!({
                "type": "object",
                "properties": {"summary": {"type": "string"}},
                "required": ["summary"],
            }),
            schema_name: "conversation_summary".to_string(),
            schema_description: None,
            max_tokens: None,
            temperature: None,
        };

        match model.invoke(request).await {
            Ok(response) => {
                let summary = response
                    .parsed
                    .get("summary")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                let mut replacement = TrackedMessage::new(
                    Message::user(summary_placeholder_text(last_step, &summary)),
                    MessageCategory::User,
                    Some(last_step),
                );
                replacement.compactable = false;

                let mut new_messages = vec![replacement];
                new_messages.extend_from_slice(&self.messages[split..]);
                self.messages = new_messages;
                self.last_compaction_step = self.current_step;
                true
            }
            Err(error) => {
                tracing::warn!(%error, "llm compaction failed, skipping");
                false
            }
        }
    }

    pub fn history_description(&self) -> String {
        crate::history::render_history_description(&self.history, DEFAULT_HISTORY_STEP_LIMIT)
    }

    pub fn history_entries(&self) -> &[ConversationEntry] {
        &self.history
    }

    pub fn save(&self) -> ConversationManagerState {
        ConversationManagerState {
            system_prompt: self.system_prompt.clone(),
            messages: self
                .messages
                .iter()
                .map(|m| PersistedMessage {
                    role: m.message.role,
                    content: m.message.content.flatten_text(),
                    is_compactable: m.compactable,
                    token_estimate: m.token_estimate,
                    step: m.step,
                    category: Some(m.category),
                })
                .collect(),
            history_items: self.history.clone(),
            current_step: self.current_step,
        }
    }

    pub fn load(compaction: CompactionConfig, state: ConversationManagerState) -> Self {
        let messages = state
            .messages
            .into_iter()
            .map(|persisted| {
                let category = persisted.category.unwrap_or(MessageCategory::User);
                let mut tracked = TrackedMessage::new(
                    Message::new(persisted.role, MessageContent::text(persisted.content)),
                    category,
                    persisted.step,
                );
                tracked.compactable = persisted.is_compactable;
                tracked.token_estimate = persisted.token_estimate;
                tracked
            })
            .collect();
        Self {
            compaction,
            system_prompt: state.system_prompt,
            messages,
            history: state.history_items,
            current_step: state.current_step,
            last_compaction_step: 0,
            masked_values: Vec::new(),
        }
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        let json = serde_json::to_string_pretty(&self.save())
            .map_err(|e| crate::error::conversation_error::ParseSnafu { message: e.to_string() }.build())?;
        std::fs::write(path, json).map_err(|e| crate::error::conversation_error::IoSnafu { message: e.to_string() }.build())
    }

    pub fn load_from_file(compaction: CompactionConfig, path: &std::path::Path) -> crate::error::Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| crate::error::conversation_error::IoSnafu { message: e.to_string() }.build())?;
        let state: ConversationManagerState = serde_json::from_str(&json)
            .map_err(|e| crate::error::conversation_error::ParseSnafu { message: e.to_string() }.build())?;
        Ok(Self::load(compaction, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConversationManager {
        let mut config = CompactionConfig::default();
        config.context_window_tokens = 1500;
        ConversationManager::new(config)
    }

    #[test]
    fn system_message_is_always_first() {
        let mut manager = manager();
        manager.add_user_message("hi");
        manager.set_instruction_builder("you are an agent");
        let messages = manager.get_messages();
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content.flatten_text(), "hi");
    }

    #[test]
    fn insertion_order_is_preserved_without_a_system_message() {
        let mut manager = manager();
        manager.add_state_message("state 1", None, Some(1));
        manager.add_assistant_message("act 1", Some(1));
        let messages = manager.get_messages();
        assert_eq!(messages[0].content.flatten_text(), "state 1");
        assert_eq!(messages[1].content.flatten_text(), "act 1");
    }

    #[test]
    fn two_consecutive_calls_without_adds_are_identical() {
        let mut manager = manager();
        manager.add_user_message("hi");
        let first = manager.get_messages();
        let second = manager.get_messages();
        assert_eq!(first, second);
    }

    #[test]
    fn ephemeral_message_is_visible_for_exactly_two_calls() {
        let mut manager = manager();
        manager.add_ephemeral_message("nudge", Role::User);
        let call1 = manager.get_messages();
        assert!(call1.iter().any(|m| m.content.flatten_text() == "nudge"));
        let call2 = manager.get_messages();
        assert!(call2.iter().any(|m| m.content.flatten_text() == "nudge"));
        let call3 = manager.get_messages();
        assert!(!call3.iter().any(|m| m.content.flatten_text() == "nudge"));
    }

    #[test]
    fn token_estimate_grows_monotonically_with_additions() {
        let mut manager = manager();
        let before = manager.estimate_total_tokens();
        manager.add_user_message("some text of a certain length");
        let after = manager.estimate_total_tokens();
        assert!(after > before);
    }

    #[test]
    fn compaction_strips_images_from_older_state_messages() {
        let mut manager = manager();
        for step in 1..=3 {
            manager.add_state_message(
                format!("state {step}"),
                Some(("AAAA".repeat(50), "image/png".to_string())),
                Some(step),
            );
        }
        let messages = manager.get_messages();
        assert!(!messages[0].content.has_image());
        assert!(!messages[1].content.has_image());
        assert!(messages[2].content.has_image());
    }

    #[test]
    fn should_compact_with_llm_requires_a_configured_interval() {
        let manager = manager();
        assert!(!manager.should_compact_with_llm());
    }

    #[test]
    fn history_description_groups_by_step() {
        let mut manager = manager();
        manager.add_state_message("loaded", None, Some(1));
        manager.add_assistant_message("clicked", Some(1));
        let description = manager.history_description();
        assert!(description.contains("State: loaded"));
        assert!(description.contains("Agent: clicked"));
    }
}
