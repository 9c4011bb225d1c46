//! `<select>` enumeration and selection handlers (§4.4 "Notable handlers").

use async_trait::async_trait;
use helm_protocol::Command;
use helm_protocol::CommandResult;

use crate::context::ExecutionContext;
use crate::handler::CommandHandler;

/// Exact match first, then case-insensitive substring, mirroring the
/// notable-handler rule for `pick_option`.
fn match_option<'a>(options: &'a [String], text: &str) -> Option<&'a str> {
    if let Some(exact) = options.iter().find(|option| option.eq_ignore_ascii_case(text)) {
        return Some(exact.as_str());
    }
    let needle = text.to_lowercase();
    options.iter().find(|option| option.to_lowercase().contains(&needle)).map(String::as_str)
}

pub struct ListOptionsHandler;

#[async_trait]
impl CommandHandler for ListOptionsHandler {
    fn name(&self) -> &str {
        "list_options"
    }

    fn description(&self) -> &str {
        "List the visible option text of a <select> element."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["index"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::ListOptions { index } = command else {
            return CommandResult::failed("list_options handler received a mismatched command");
        };
        match ctx.dom_service.list_select_options(&ctx.page(), &ctx.cdp(), *index).await {
            Ok(options) if options.is_empty() => CommandResult::ok_with_content("no options found"),
            Ok(options) => CommandResult::ok_with_content(options.join("\n")),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

pub struct PickOptionHandler;

#[async_trait]
impl CommandHandler for PickOptionHandler {
    fn name(&self) -> &str {
        "pick_option"
    }

    fn description(&self) -> &str {
        "Select a <select> option by exact, then substring, case-insensitive text match."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["index", "text"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::PickOption { index, text } = command else {
            return CommandResult::failed("pick_option handler received a mismatched command");
        };

        let options = match ctx.dom_service.list_select_options(&ctx.page(), &ctx.cdp(), *index).await {
            Ok(options) => options,
            Err(error) => return CommandResult::failed(error.to_string()),
        };

        let Some(matched) = match_option(&options, text) else {
            return CommandResult::failed(format!("no option matching \"{text}\" was found"));
        };
        let matched = matched.to_string();

        match ctx.dom_service.select_option_by_text(&ctx.page(), &ctx.cdp(), *index, &matched).await {
            Ok(()) => CommandResult::ok(),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins_over_substring() {
        let options = vec!["US".to_string(), "United States".to_string()];
        assert_eq!(match_option(&options, "us"), Some("US"));
    }

    #[test]
    fn falls_back_to_case_insensitive_substring() {
        let options = vec!["United States".to_string(), "United Kingdom".to_string()];
        assert_eq!(match_option(&options, "kingdom"), Some("United Kingdom"));
    }

    #[test]
    fn no_match_returns_none() {
        let options = vec!["Canada".to_string()];
        assert_eq!(match_option(&options, "france"), None);
    }
}
