//! Preflight (§4.1 "Preflight"): what runs before step 1.

use helm_protocol::Command;
use regex::Regex;
use std::sync::OnceLock;

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"https?://[^\s<>\x22]+").expect("static pattern"))
}

/// The first `http(s)://` URL appearing in `text`, if any (§4.1 "Preflight":
/// auto-navigate to the first URL mentioned in the task).
pub fn extract_first_url(text: &str) -> Option<String> {
    url_pattern().find(text).map(|m| m.as_str().to_string())
}

/// Parse the configured `preflight_commands` (each a JSON-encoded
/// [`Command`]); entries that fail to parse are dropped with a warning
/// rather than failing the run, since preflight failures are already
/// ignored individually (§4.1 "Preflight").
pub fn parse_preflight_commands(raw: &[String]) -> Vec<Command> {
    raw.iter()
        .filter_map(|entry| match serde_json::from_str::<Command>(entry) {
            Ok(command) => Some(command),
            Err(error) => {
                tracing::warn!(%error, entry = %entry, "skipping malformed preflight command");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_first_url_and_ignores_trailing_punctuation_free_text() {
        let text = "Go to https://example.com/login and sign in, then check https://example.com/done";
        assert_eq!(extract_first_url(text).as_deref(), Some("https://example.com/login"));
    }

    #[test]
    fn returns_none_when_no_url_is_present() {
        assert_eq!(extract_first_url("summarise the homepage"), None);
    }

    #[test]
    fn malformed_preflight_entries_are_dropped_not_fatal() {
        let raw = vec!["{\"action\":\"back\"}".to_string(), "not json".to_string()];
        let commands = parse_preflight_commands(&raw);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0], Command::Back);
    }
}
