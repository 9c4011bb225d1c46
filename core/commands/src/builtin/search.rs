//! In-page search handlers: `find`, `search`, `scroll_to` (§4.4 "Notable
//! handlers").

use std::time::Duration;

use async_trait::async_trait;
use helm_protocol::Command;
use helm_protocol::CommandResult;

use crate::collaborators::ElementCandidate;
use crate::context::ExecutionContext;
use crate::handler::CommandHandler;

const MAX_FIND_RESULTS: usize = 20;
const SCROLL_TO_SETTLE: Duration = Duration::from_millis(500);

fn matches_query(candidate: &ElementCandidate, query: &str) -> bool {
    let query = query.to_lowercase();
    candidate.text.to_lowercase().contains(&query)
        || candidate.aria_label.as_deref().is_some_and(|v| v.to_lowercase().contains(&query))
        || candidate.placeholder.as_deref().is_some_and(|v| v.to_lowercase().contains(&query))
        || candidate.title.as_deref().is_some_and(|v| v.to_lowercase().contains(&query))
}

fn format_candidate(candidate: &ElementCandidate) -> String {
    let text = candidate.text.trim();
    format!("[{}] <{} {}> {}", candidate.index, candidate.tag, candidate.attrs, text)
}

pub struct FindHandler;

#[async_trait]
impl CommandHandler for FindHandler {
    fn name(&self) -> &str {
        "find"
    }

    fn description(&self) -> &str {
        "Search the curated interactive/content selector set for elements matching a query."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["query"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::Find { query } = command else {
            return CommandResult::failed("find handler received a mismatched command");
        };

        let candidates = match ctx.dom_service.enumerate_candidates(&ctx.page(), &ctx.cdp()).await {
            Ok(candidates) => candidates,
            Err(error) => return CommandResult::failed(error.to_string()),
        };

        let matches: Vec<String> = candidates
            .iter()
            .filter(|candidate| matches_query(candidate, query))
            .take(MAX_FIND_RESULTS)
            .map(format_candidate)
            .collect();

        if matches.is_empty() {
            CommandResult::ok_with_content("no matching elements found")
        } else {
            CommandResult::ok_with_content(matches.join("\n"))
        }
    }
}

/// `search`: the in-page analogue of browser find-in-page. Unlike `find`,
/// which enumerates interactive elements, this walks text nodes directly.
pub struct SearchHandler;

#[async_trait]
impl CommandHandler for SearchHandler {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the current page's text content for a query."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["query"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::Search { query } = command else {
            return CommandResult::failed("search handler received a mismatched command");
        };

        match ctx.dom_service.find_text_node(&ctx.page(), &ctx.cdp(), query).await {
            Ok(Some(index)) => CommandResult::ok_with_content(format!("found a match at index {index}")),
            Ok(None) => CommandResult::ok_with_content("no match found"),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

pub struct ScrollToHandler;

#[async_trait]
impl CommandHandler for ScrollToHandler {
    fn name(&self) -> &str {
        "scroll_to"
    }

    fn description(&self) -> &str {
        "Scroll the first element whose text matches the query into view."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["text"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::ScrollTo { text } = command else {
            return CommandResult::failed("scroll_to handler received a mismatched command");
        };

        let index = match ctx.dom_service.find_text_node(&ctx.page(), &ctx.cdp(), text).await {
            Ok(Some(index)) => index,
            Ok(None) => return CommandResult::failed(format!("no element containing \"{text}\" was found")),
            Err(error) => return CommandResult::failed(error.to_string()),
        };

        if let Err(error) = ctx.dom_service.scroll_into_view(&ctx.page(), &ctx.cdp(), index).await {
            return CommandResult::failed(error.to_string());
        }

        tokio::time::sleep(SCROLL_TO_SETTLE).await;
        CommandResult::ok()
    }
}
