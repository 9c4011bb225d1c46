//! Navigation and tab-management handlers (§4.4 "Notable handlers", §4.4
//! "URL policy").

use async_trait::async_trait;
use helm_protocol::Command;
use helm_protocol::CommandResult;

use crate::context::ExecutionContext;
use crate::handler::CommandHandler;

fn url_blocked_result(url: &str) -> CommandResult {
    CommandResult::failed(format!("blocked by URL policy: {url}"))
}

pub struct NavigateHandler;

#[async_trait]
impl CommandHandler for NavigateHandler {
    fn name(&self) -> &str {
        "navigate"
    }

    fn description(&self) -> &str {
        "Navigate the current page to a URL."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["url"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::Navigate { url } = command else {
            return CommandResult::failed("navigate handler received a mismatched command");
        };
        if !ctx.is_url_permitted(url) {
            return url_blocked_result(url);
        }
        match ctx.browser_session.navigate(url).await {
            Ok(()) => CommandResult::ok(),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

pub struct BackHandler;

#[async_trait]
impl CommandHandler for BackHandler {
    fn name(&self) -> &str {
        "back"
    }

    fn description(&self) -> &str {
        "Navigate back in the current tab's history."
    }

    async fn handle(&self, _command: &Command, ctx: &ExecutionContext) -> CommandResult {
        match ctx.browser_session.go_back().await {
            Ok(()) => CommandResult::ok(),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

pub struct FocusTabHandler;

#[async_trait]
impl CommandHandler for FocusTabHandler {
    fn name(&self) -> &str {
        "focus_tab"
    }

    fn description(&self) -> &str {
        "Switch focus to the tab at the given index."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["index"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::FocusTab { index } = command else {
            return CommandResult::failed("focus_tab handler received a mismatched command");
        };
        match ctx.browser_session.switch_tab(*index).await {
            Ok(()) => CommandResult::ok(),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

pub struct NewTabHandler;

#[async_trait]
impl CommandHandler for NewTabHandler {
    fn name(&self) -> &str {
        "new_tab"
    }

    fn description(&self) -> &str {
        "Open a new tab, optionally navigating it to a URL."
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::NewTab { url } = command else {
            return CommandResult::failed("new_tab handler received a mismatched command");
        };
        if let Some(url) = url {
            if !ctx.is_url_permitted(url) {
                return url_blocked_result(url);
            }
        }
        match ctx.browser_session.new_tab(url.as_deref()).await {
            Ok(()) => CommandResult::ok(),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

pub struct CloseTabHandler;

#[async_trait]
impl CommandHandler for CloseTabHandler {
    fn name(&self) -> &str {
        "close_tab"
    }

    fn description(&self) -> &str {
        "Close a tab, defaulting to the current one."
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::CloseTab { index } = command else {
            return CommandResult::failed("close_tab handler received a mismatched command");
        };
        match ctx.browser_session.close_tab(*index).await {
            Ok(()) => CommandResult::ok(),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

/// `web_search` navigates the current tab to a search engine results page
/// (§1 excludes the search provider's own API, this is plain navigation).
pub struct WebSearchHandler;

#[async_trait]
impl CommandHandler for WebSearchHandler {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Navigate to a web search results page for the given query."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["query"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::WebSearch { query } = command else {
            return CommandResult::failed("web_search handler received a mismatched command");
        };
        let url = format!("https://www.google.com/search?q={}", urlencode(query));
        if !ctx.is_url_permitted(&url) {
            return url_blocked_result(&url);
        }
        match ctx.browser_session.navigate(&url).await {
            Ok(()) => CommandResult::ok(),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

fn urlencode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            b' ' => encoded.push('+'),
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencode_escapes_reserved_bytes() {
        assert_eq!(urlencode("rust async/await"), "rust+async%2Fawait");
    }
}
