//! Structured history record and the human-readable history description
//! (§3 `ConversationEntry`, §4.2 "History description").

use helm_protocol::MessageCategory;
use serde::Deserialize;
use serde::Serialize;

const SUMMARY_LIMIT: usize = 120;
const CONTENT_LIMIT: usize = 2000;

/// An append-only, never-mutated structured history record (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub step: i64,
    pub category: MessageCategory,
    pub summary: String,
    pub content: String,
    pub has_screenshot: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ConversationEntry {
    pub fn new(
        step: i64,
        category: MessageCategory,
        summary: impl Into<String>,
        content: impl Into<String>,
        has_screenshot: bool,
    ) -> Self {
        Self {
            step,
            category,
            summary: truncate(&summary.into(), SUMMARY_LIMIT),
            content: truncate(&content.into(), CONTENT_LIMIT),
            has_screenshot,
            timestamp: chrono::Utc::now(),
        }
    }
}

fn truncate(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        s.to_string()
    } else {
        s.chars().take(limit).collect()
    }
}

/// Render the history description (§4.2): group entries by step; if the
/// step count is within `step_limit_shown`, render every step, otherwise
/// render the first half and the trailing steps with an omission marker in
/// between.
pub fn render_history_description(entries: &[ConversationEntry], step_limit_shown: usize) -> String {
    let steps = group_by_step(entries);
    if steps.len() <= step_limit_shown {
        return steps
            .iter()
            .map(|(_, entries)| render_step(entries))
            .collect::<Vec<_>>()
            .join("\n");
    }

    let head_count = step_limit_shown.div_ceil(2);
    let tail_count = step_limit_shown - head_count;
    let omitted = steps.len() - head_count - tail_count;

    let mut lines = Vec::new();
    for (_, entries) in steps.iter().take(head_count) {
        lines.push(render_step(entries));
    }
    lines.push(format!("  ... ({omitted} steps omitted) ..."));
    for (_, entries) in steps.iter().skip(steps.len() - tail_count) {
        lines.push(render_step(entries));
    }
    lines.join("\n")
}

fn group_by_step(entries: &[ConversationEntry]) -> Vec<(i64, Vec<&ConversationEntry>)> {
    let mut groups: Vec<(i64, Vec<&ConversationEntry>)> = Vec::new();
    for entry in entries {
        match groups.last_mut() {
            Some((step, bucket)) if *step == entry.step => bucket.push(entry),
            _ => groups.push((entry.step, vec![entry])),
        }
    }
    groups
}

fn render_step(entries: &[&ConversationEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{}: {}", entry.category.history_prefix(), entry.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(step: i64, category: MessageCategory, summary: &str) -> ConversationEntry {
        ConversationEntry::new(step, category, summary, summary, false)
    }

    #[test]
    fn summary_and_content_are_truncated() {
        let long = "x".repeat(200);
        let entry = ConversationEntry::new(1, MessageCategory::User, long.clone(), long.clone(), false);
        assert_eq!(entry.summary.len(), SUMMARY_LIMIT);
        assert_eq!(entry.content.len(), CONTENT_LIMIT.min(200));
    }

    #[test]
    fn short_history_renders_every_step() {
        let entries = vec![
            entry(1, MessageCategory::State, "loaded page"),
            entry(2, MessageCategory::Assistant, "clicked button"),
        ];
        let rendered = render_history_description(&entries, 10);
        assert!(rendered.contains("State: loaded page"));
        assert!(rendered.contains("Agent: clicked button"));
        assert!(!rendered.contains("omitted"));
    }

    #[test]
    fn long_history_omits_a_middle_block() {
        let entries: Vec<_> = (1..=10)
            .map(|step| entry(step, MessageCategory::State, &format!("step {step}")))
            .collect();
        let rendered = render_history_description(&entries, 4);
        assert!(rendered.contains("step 1"));
        assert!(rendered.contains("step 2"));
        assert!(rendered.contains("step 9"));
        assert!(rendered.contains("step 10"));
        assert!(rendered.contains("steps omitted"));
        assert!(!rendered.contains("step 5"));
    }
}
