//! Page-reading and extraction handlers (§4.4 "Notable handlers").

use async_trait::async_trait;
use helm_model::ModelRequest;
use helm_protocol::Command;
use helm_protocol::CommandResult;
use helm_protocol::Message;

use crate::context::ExecutionContext;
use crate::handler::CommandHandler;

const MARKDOWN_TRUNCATION_LIMIT: usize = 8000;

fn truncate_markdown(markdown: &str) -> String {
    if markdown.chars().count() <= MARKDOWN_TRUNCATION_LIMIT {
        return markdown.to_string();
    }
    markdown.chars().take(MARKDOWN_TRUNCATION_LIMIT).collect()
}

const UNSTRUCTURED_EXTRACTION_SCHEMA_NAME: &str = "extraction_result";

fn unstructured_extraction_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {"result": {"type": "string"}},
        "required": ["result"],
    })
}

pub struct ExtractHandler;

#[async_trait]
impl CommandHandler for ExtractHandler {
    fn name(&self) -> &str {
        "extract"
    }

    fn description(&self) -> &str {
        "Extract information from the current page, optionally against a JSON schema."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["query"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::Extract { query, schema } = command else {
            return CommandResult::failed("extract handler received a mismatched command");
        };

        let markdown = match ctx.dom_service.page_markdown(&ctx.page(), &ctx.cdp()).await {
            Ok(markdown) => truncate_markdown(&markdown),
            Err(error) => return CommandResult::failed(error.to_string()),
        };

        let Some(model) = &ctx.extraction_llm else {
            return CommandResult::ok_with_content(markdown);
        };

        let (response_schema, schema_name) = match schema {
            Some(schema) => (schema.clone(), "extraction_schema".to_string()),
            None => (unstructured_extraction_schema(), UNSTRUCTURED_EXTRACTION_SCHEMA_NAME.to_string()),
        };

        let request = ModelRequest {
            messages: vec![Message::user(format!("{query}\n\n{markdown}"))],
            response_schema,
            schema_name,
            schema_description: None,
            max_tokens: None,
            temperature: None,
        };

        match model.invoke(request).await {
            Ok(response) => CommandResult::ok_with_content(response.parsed.to_string()),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

pub struct ExtractStructuredHandler;

#[async_trait]
impl CommandHandler for ExtractStructuredHandler {
    fn name(&self) -> &str {
        "extract_structured"
    }

    fn description(&self) -> &str {
        "Extract structured data from the current page against a required JSON schema."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["query", "schema"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::ExtractStructured { query, schema } = command else {
            return CommandResult::failed("extract_structured handler received a mismatched command");
        };

        let Some(model) = &ctx.extraction_llm else {
            return CommandResult::failed("no extraction model is configured for this run");
        };

        let markdown = match ctx.dom_service.page_markdown(&ctx.page(), &ctx.cdp()).await {
            Ok(markdown) => truncate_markdown(&markdown),
            Err(error) => return CommandResult::failed(error.to_string()),
        };

        let request = ModelRequest {
            messages: vec![Message::user(format!("{query}\n\n{markdown}"))],
            response_schema: schema.clone(),
            schema_name: "extraction_schema".to_string(),
            schema_description: None,
            max_tokens: None,
            temperature: None,
        };

        match model.invoke(request).await {
            Ok(response) => CommandResult::ok_with_content(response.parsed.to_string()),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

pub struct ReadPageHandler;

#[async_trait]
impl CommandHandler for ReadPageHandler {
    fn name(&self) -> &str {
        "read_page"
    }

    fn description(&self) -> &str {
        "Return the current page's content as markdown, truncated to 8000 characters."
    }

    async fn handle(&self, _command: &Command, ctx: &ExecutionContext) -> CommandResult {
        match ctx.dom_service.page_markdown(&ctx.page(), &ctx.cdp()).await {
            Ok(markdown) => CommandResult::ok_with_content(truncate_markdown(&markdown)),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

pub struct CaptureHandler;

#[async_trait]
impl CommandHandler for CaptureHandler {
    fn name(&self) -> &str {
        "capture"
    }

    fn description(&self) -> &str {
        "Take a screenshot of the current page."
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::Capture { full_page } = command else {
            return CommandResult::failed("capture handler received a mismatched command");
        };
        match ctx.browser_session.screenshot(full_page.unwrap_or(false)).await {
            Ok(screenshot) => CommandResult::ok_with_content(screenshot.base64),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

pub struct FinishHandler;

#[async_trait]
impl CommandHandler for FinishHandler {
    fn name(&self) -> &str {
        "finish"
    }

    fn description(&self) -> &str {
        "End the run, reporting whether the task succeeded."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["text"]})
    }

    fn terminates_sequence(&self) -> bool {
        true
    }

    async fn handle(&self, command: &Command, _ctx: &ExecutionContext) -> CommandResult {
        let Command::Finish { text, success } = command else {
            return CommandResult::failed("finish handler received a mismatched command");
        };
        CommandResult::done(text, success.unwrap_or(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_markdown_caps_at_the_limit() {
        let long = "a".repeat(MARKDOWN_TRUNCATION_LIMIT + 500);
        assert_eq!(truncate_markdown(&long).chars().count(), MARKDOWN_TRUNCATION_LIMIT);
    }

    #[test]
    fn truncate_markdown_leaves_short_text_untouched() {
        assert_eq!(truncate_markdown("hello"), "hello");
    }
}
