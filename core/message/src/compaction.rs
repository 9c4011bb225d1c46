//! Compaction: the basic (local, synchronous) pass and the LLM-assisted
//! pass's pure helpers (§4.2 "Basic compaction", "LLM compaction").

use helm_protocol::Message;
use helm_protocol::MessageCategory;
use helm_protocol::MessageContent;
use helm_protocol::TrackedMessage;

const SUMMARY_MESSAGE_CHAR_LIMIT: usize = 500;

/// Run the two-stage basic compaction pass in place:
/// 1. Keep images only in the most recent compactable message that has any;
///    strip images from every older compactable message.
/// 2. While still over `context_window_tokens` and more than 4 messages
///    remain, replace the oldest compactable message with a summary
///    placeholder.
///
/// Returns whether anything changed, so the caller can skip a redundant
/// `estimate_total_tokens` recomputation.
pub fn basic_compact(messages: &mut [TrackedMessage], context_window_tokens: i64) -> bool {
    let mut changed = strip_older_images(messages);

    while total_tokens(messages) > context_window_tokens && messages.len() > 4 {
        if let Some(index) = messages
            .iter()
            .position(|m| m.compactable && m.category != MessageCategory::CompactionSummary)
        {
            replace_with_summary(&mut messages[index]);
            changed = true;
        } else {
            break;
        }
    }

    changed
}

fn strip_older_images(messages: &mut [TrackedMessage]) -> bool {
    let mut changed = false;
    let mut kept_images = false;
    for message in messages.iter_mut().rev() {
        if !message.compactable || !message.message.content.has_image() {
            continue;
        }
        if !kept_images {
            kept_images = true;
            continue;
        }
        message.message.content = message.message.content.without_images();
        message.refresh_token_estimate();
        changed = true;
    }
    changed
}

fn replace_with_summary(message: &mut TrackedMessage) {
    let step = message.step.unwrap_or(0);
    message.message = Message::new(
        message.message.role,
        MessageContent::text(format!("[Step {step} state omitted to save tokens]")),
    );
    message.category = MessageCategory::CompactionSummary;
    message.refresh_token_estimate();
}

fn total_tokens(messages: &[TrackedMessage]) -> i64 {
    messages.iter().map(|m| m.token_estimate).sum()
}

/// How many of the most recent messages to keep verbatim when building an
/// LLM-compaction prompt (§4.2: `min(6, floor(len/2))`).
pub fn verbatim_tail_count(len: usize) -> usize {
    std::cmp::min(6, len / 2)
}

/// Build the two-message summarisation prompt: a system instruction plus a
/// user transcript of the prefix being summarised, each message's text
/// bounded to `SUMMARY_MESSAGE_CHAR_LIMIT` chars.
pub fn build_summarisation_transcript(prefix: &[TrackedMessage]) -> String {
    prefix
        .iter()
        .map(|m| {
            let text = m.message.content.flatten_text();
            let bounded: String = text.chars().take(SUMMARY_MESSAGE_CHAR_LIMIT).collect();
            format!("[{:?}] {}", m.message.role, bounded)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub const SUMMARISER_SYSTEM_INSTRUCTION: &str =
    "Summarise the following conversation transcript into a concise paragraph \
     that preserves the task, key decisions, and outstanding state. Respond \
     with only the summary.";

/// The replacement message for a compacted prefix (§4.2: `[Conversation
/// summary of steps 1-K]`).
pub fn summary_placeholder_text(last_step: i64, summary: &str) -> String {
    format!("[Conversation summary of steps 1-{last_step}]\n{summary}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use helm_protocol::ContentPart;
    use helm_protocol::Role;

    fn image_message(step: i64) -> TrackedMessage {
        TrackedMessage::new(
            Message::new(
                Role::User,
                MessageContent::Parts(vec![
                    ContentPart::text("state"),
                    ContentPart::image("AAAA", "image/png"),
                ]),
            ),
            MessageCategory::State,
            Some(step),
        )
    }

    #[test]
    fn strips_images_from_all_but_the_newest() {
        let mut messages = vec![image_message(1), image_message(2), image_message(3)];
        strip_older_images(&mut messages);
        assert!(!messages[0].message.content.has_image());
        assert!(!messages[1].message.content.has_image());
        assert!(messages[2].message.content.has_image());
    }

    #[test]
    fn basic_compact_replaces_oldest_when_still_over_budget() {
        let mut messages: Vec<_> = (1..=6)
            .map(|step| TrackedMessage::new(Message::user("x".repeat(100)), MessageCategory::State, Some(step)))
            .collect();
        let total_before = messages.iter().map(|m| m.token_estimate).sum::<i64>();
        basic_compact(&mut messages, total_before / 2);
        assert_eq!(messages[0].category, MessageCategory::CompactionSummary);
        assert!(messages[0].message.content.flatten_text().contains("omitted"));
    }

    #[test]
    fn basic_compact_stops_once_four_messages_remain() {
        let mut messages: Vec<_> = (1..=4)
            .map(|step| TrackedMessage::new(Message::user("x".repeat(10_000)), MessageCategory::State, Some(step)))
            .collect();
        basic_compact(&mut messages, 1);
        // Over budget but at the floor of 4 messages: no further replacement happens
        // beyond what compaction already allows per message, length stays 4.
        assert_eq!(messages.len(), 4);
    }

    #[test]
    fn verbatim_tail_count_caps_at_six() {
        assert_eq!(verbatim_tail_count(20), 6);
        assert_eq!(verbatim_tail_count(7), 3);
        assert_eq!(verbatim_tail_count(1), 0);
    }
}
