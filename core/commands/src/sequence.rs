//! Sequence execution: cap, masking, and the stop rule (§4.4 "Sequence
//! execution").

use helm_message::MaskedValue;
use helm_message::redact_text;
use helm_protocol::Command;
use helm_protocol::CommandResult;

use crate::catalog::CommandCatalog;
use crate::context::ExecutionContext;

/// Run `commands` against `catalog`, capped at `commands_per_step`, masking
/// sensitive values in each result's `extractedContent`/`error`, and
/// stopping early when a result is done, the handler terminates the
/// sequence, or the classified error is non-retryable.
pub async fn execute_sequence(
    catalog: &CommandCatalog,
    commands: &[Command],
    ctx: &ExecutionContext,
    commands_per_step: usize,
) -> Vec<CommandResult> {
    let mut results = Vec::new();

    for command in commands.iter().take(commands_per_step) {
        let action = command.action_name().to_string();
        let mut result = match catalog.dispatch(command, ctx).await {
            Ok(result) => result,
            Err(error) => CommandResult::failed(error.to_string()),
        };

        mask_result(&mut result, &ctx.masked_values);
        let is_done = result.is_done;
        let handler_terminates = catalog.terminates_sequence(&action);
        let non_retryable_failure = !result.success
            && result
                .error
                .as_deref()
                .map(|raw| !crate::classification::classify(raw).is_retryable)
                .unwrap_or(false);

        results.push(result);

        if is_done || handler_terminates || non_retryable_failure {
            break;
        }
    }

    results
}

fn mask_result(result: &mut CommandResult, masked_values: &[MaskedValue]) {
    if masked_values.is_empty() {
        return;
    }
    if let Some(content) = &result.extracted_content {
        result.extracted_content = Some(redact_text(content, masked_values));
    }
    if let Some(error) = &result.error {
        result.error = Some(redact_text(error, masked_values));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::BrowserCollaborator;
    use crate::collaborators::BrowserState;
    use crate::collaborators::CdpHandle;
    use crate::collaborators::PageAnalysis;
    use crate::collaborators::PageAnalyzer;
    use crate::collaborators::PageHandle;
    use crate::collaborators::ScrollPosition;
    use crate::collaborators::Screenshot;
    use crate::handler::CommandHandler;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FakeBrowser;

    #[async_trait]
    impl BrowserCollaborator for FakeBrowser {
        fn is_connected(&self) -> bool {
            true
        }
        async fn start(&self) -> crate::error::Result<()> {
            Ok(())
        }
        async fn navigate(&self, _url: &str) -> crate::error::Result<()> {
            Ok(())
        }
        async fn go_back(&self) -> crate::error::Result<()> {
            Ok(())
        }
        async fn get_state(&self) -> crate::error::Result<BrowserState> {
            Ok(BrowserState {
                url: "https://example.com".to_string(),
                title: "Example".to_string(),
                tabs: vec![],
            })
        }
        async fn screenshot(&self, _full_page: bool) -> crate::error::Result<Screenshot> {
            Ok(Screenshot { base64: String::new(), width: 0, height: 0 })
        }
        fn current_page(&self) -> PageHandle {
            Arc::new(())
        }
        fn cdp(&self) -> CdpHandle {
            Arc::new(())
        }
        async fn switch_tab(&self, _index: i64) -> crate::error::Result<()> {
            Ok(())
        }
        async fn new_tab(&self, _url: Option<&str>) -> crate::error::Result<()> {
            Ok(())
        }
        async fn close_tab(&self, _index: Option<i64>) -> crate::error::Result<()> {
            Ok(())
        }
        async fn wait_for_page_ready(&self) -> crate::error::Result<()> {
            Ok(())
        }
        async fn press_keys(&self, _keys: &str) -> crate::error::Result<()> {
            Ok(())
        }
        async fn scroll(&self, _direction: helm_protocol::ScrollDirection, _index: Option<i64>) -> crate::error::Result<()> {
            Ok(())
        }
        async fn close(&self) -> crate::error::Result<()> {
            Ok(())
        }
    }

    struct FakeAnalyzer;

    #[async_trait]
    impl PageAnalyzer for FakeAnalyzer {
        async fn extract_state(&self, _page: &PageHandle, _cdp: &CdpHandle) -> crate::error::Result<PageAnalysis> {
            Ok(PageAnalysis {
                tree: serde_json::json!({}),
                selector_map: serde_json::json!({}),
                element_count: 0,
                scroll_position: ScrollPosition::default(),
                pixels_above: 0,
                pixels_below: 0,
            })
        }
        async fn click_element_by_index(&self, _page: &PageHandle, _cdp: &CdpHandle, _index: i64) -> crate::error::Result<()> {
            Ok(())
        }
        async fn input_text_by_index(
            &self,
            _page: &PageHandle,
            _cdp: &CdpHandle,
            _index: i64,
            _text: &str,
            _clear_first: bool,
        ) -> crate::error::Result<()> {
            Ok(())
        }
        fn get_element_selector(&self, _index: i64) -> Option<String> {
            None
        }
        async fn enumerate_candidates(
            &self,
            _page: &PageHandle,
            _cdp: &CdpHandle,
        ) -> crate::error::Result<Vec<crate::collaborators::ElementCandidate>> {
            Ok(vec![])
        }
        async fn page_markdown(&self, _page: &PageHandle, _cdp: &CdpHandle) -> crate::error::Result<String> {
            Ok(String::new())
        }
        async fn find_text_node(&self, _page: &PageHandle, _cdp: &CdpHandle, _text: &str) -> crate::error::Result<Option<i64>> {
            Ok(None)
        }
        async fn scroll_into_view(&self, _page: &PageHandle, _cdp: &CdpHandle, _index: i64) -> crate::error::Result<()> {
            Ok(())
        }
        async fn list_select_options(&self, _page: &PageHandle, _cdp: &CdpHandle, _index: i64) -> crate::error::Result<Vec<String>> {
            Ok(vec![])
        }
        async fn select_option_by_text(
            &self,
            _page: &PageHandle,
            _cdp: &CdpHandle,
            _index: i64,
            _option_text: &str,
        ) -> crate::error::Result<()> {
            Ok(())
        }
        async fn select_option_by_value(
            &self,
            _page: &PageHandle,
            _cdp: &CdpHandle,
            _index: i64,
            _value: &str,
        ) -> crate::error::Result<()> {
            Ok(())
        }
        async fn upload_file(
            &self,
            _page: &PageHandle,
            _cdp: &CdpHandle,
            _index: i64,
            _resolved_path: &std::path::Path,
        ) -> crate::error::Result<()> {
            Ok(())
        }
    }

    struct AlwaysDone;

    #[async_trait]
    impl CommandHandler for AlwaysDone {
        fn name(&self) -> &str {
            "finish"
        }
        fn description(&self) -> &str {
            "test"
        }
        async fn handle(&self, _command: &Command, _ctx: &ExecutionContext) -> CommandResult {
            CommandResult::done("done", true)
        }
    }

    struct AlwaysOk;

    #[async_trait]
    impl CommandHandler for AlwaysOk {
        fn name(&self) -> &str {
            "back"
        }
        fn description(&self) -> &str {
            "test"
        }
        async fn handle(&self, _command: &Command, _ctx: &ExecutionContext) -> CommandResult {
            CommandResult::ok()
        }
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(Arc::new(FakeBrowser), Arc::new(FakeAnalyzer))
    }

    #[tokio::test]
    async fn stops_sequence_once_is_done() {
        let mut catalog = CommandCatalog::new();
        catalog.register(AlwaysOk);
        catalog.register(AlwaysDone);

        let commands = vec![Command::Back, Command::Finish { text: "x".to_string(), success: None }, Command::Back];
        let results = execute_sequence(&catalog, &commands, &ctx(), 10).await;
        assert_eq!(results.len(), 2);
        assert!(results[1].is_done);
    }

    #[tokio::test]
    async fn caps_at_commands_per_step() {
        let mut catalog = CommandCatalog::new();
        catalog.register(AlwaysOk);

        let commands = vec![Command::Back, Command::Back, Command::Back];
        let results = execute_sequence(&catalog, &commands, &ctx(), 2).await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn masks_sensitive_values_in_results() {
        struct LeakyHandler;

        #[async_trait]
        impl CommandHandler for LeakyHandler {
            fn name(&self) -> &str {
                "read_page"
            }
            fn description(&self) -> &str {
                "test"
            }
            async fn handle(&self, _command: &Command, _ctx: &ExecutionContext) -> CommandResult {
                CommandResult::ok_with_content("the password is hunter2")
            }
        }

        let mut catalog = CommandCatalog::new();
        catalog.register(LeakyHandler);

        let mut context = ctx();
        context.masked_values = vec![MaskedValue::new("password", "hunter2")];

        let results = execute_sequence(&catalog, &[Command::ReadPage], &context, 10).await;
        assert!(!results[0].extracted_content.as_ref().expect("content").contains("hunter2"));
    }
}
