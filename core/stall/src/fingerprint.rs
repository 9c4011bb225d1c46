//! Action and page fingerprinting (§4.3 "Fingerprinting rules").

use helm_protocol::Command;
use helm_protocol::ScrollDirection;

/// Normalise one command into a stable string used for repetition and cycle
/// detection. Variants with no dedicated rule fall back to a structural
/// serialisation of the command ("Others" in the spec's rule table).
pub fn normalize_action(command: &Command) -> String {
    match command {
        Command::Tap { index } => format!("click:{index}"),
        Command::TypeText { index, text } => format!("input_text:{index}:{text}"),
        Command::Navigate { url } => format!("go_to_url:{url}"),
        Command::WebSearch { query } => format!("search_google:{}", normalize_query(query)),
        Command::Search { query } => format!("search_page:{}", normalize_query(query)),
        Command::Scroll { direction, index } => {
            let direction = match direction {
                ScrollDirection::Up => "up",
                ScrollDirection::Down => "down",
            };
            let target = index
                .map(|i| i.to_string())
                .unwrap_or_else(|| "page".to_string());
            format!("scroll:{direction}:{target}")
        }
        Command::Finish { text, .. } => {
            let truncated: String = text.chars().take(50).collect();
            format!("done:{truncated}")
        }
        other => serde_json::to_string(other).unwrap_or_else(|_| other.action_name().to_string()),
    }
}

/// `lowercase, split on whitespace, drop empties, sort tokens, rejoin with a
/// single space` - makes `web_search`/`search` fingerprints order-invariant
/// over query tokens.
pub fn normalize_query(query: &str) -> String {
    let mut tokens: Vec<&str> = query.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ").to_lowercase()
}

/// Join one step's per-command fingerprints into a single action record.
pub fn join_step_fingerprint(fingerprints: &[String]) -> String {
    fingerprints.join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_drops_everything_but_the_index() {
        assert_eq!(normalize_action(&Command::Tap { index: 3 }), "click:3");
    }

    #[test]
    fn search_query_normalisation_is_order_invariant() {
        let a = normalize_action(&Command::WebSearch {
            query: "best pizza NYC".to_string(),
        });
        let b = normalize_action(&Command::WebSearch {
            query: "NYC best pizza".to_string(),
        });
        assert_eq!(a, b);
    }

    #[test]
    fn scroll_without_index_targets_the_page() {
        let cmd = Command::Scroll {
            direction: ScrollDirection::Down,
            index: None,
        };
        assert_eq!(normalize_action(&cmd), "scroll:down:page");
    }

    #[test]
    fn finish_truncates_text_to_fifty_chars() {
        let cmd = Command::Finish {
            text: "x".repeat(80),
            success: None,
        };
        let fp = normalize_action(&cmd);
        assert_eq!(fp, format!("done:{}", "x".repeat(50)));
    }

    #[test]
    fn step_fingerprints_join_with_pipe() {
        let joined = join_step_fingerprint(&["click:1".to_string(), "scroll:down:page".to_string()]);
        assert_eq!(joined, "click:1|scroll:down:page");
    }
}
