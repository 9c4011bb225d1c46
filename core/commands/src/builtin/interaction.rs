//! Index-addressed element interaction handlers (§4.4).

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use helm_protocol::Command;
use helm_protocol::CommandResult;

use crate::context::ExecutionContext;
use crate::handler::CommandHandler;

pub struct TapHandler;

#[async_trait]
impl CommandHandler for TapHandler {
    fn name(&self) -> &str {
        "tap"
    }

    fn description(&self) -> &str {
        "Click the element at the given index."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["index"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::Tap { index } = command else {
            return CommandResult::failed("tap handler received a mismatched command");
        };
        match ctx.dom_service.click_element_by_index(&ctx.page(), &ctx.cdp(), *index).await {
            Ok(()) => CommandResult::ok(),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

pub struct TypeTextHandler;

#[async_trait]
impl CommandHandler for TypeTextHandler {
    fn name(&self) -> &str {
        "type_text"
    }

    fn description(&self) -> &str {
        "Type text into the element at the given index, clearing it first."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["index", "text"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::TypeText { index, text } = command else {
            return CommandResult::failed("type_text handler received a mismatched command");
        };
        match ctx
            .dom_service
            .input_text_by_index(&ctx.page(), &ctx.cdp(), *index, text, true)
            .await
        {
            Ok(()) => CommandResult::ok(),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

pub struct PressKeysHandler;

#[async_trait]
impl CommandHandler for PressKeysHandler {
    fn name(&self) -> &str {
        "press_keys"
    }

    fn description(&self) -> &str {
        "Send a keyboard chord to the focused element, e.g. \"Enter\" or \"Control+a\"."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["keys"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::PressKeys { keys } = command else {
            return CommandResult::failed("press_keys handler received a mismatched command");
        };
        match ctx.browser_session.press_keys(keys).await {
            Ok(()) => CommandResult::ok(),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

pub struct ScrollHandler;

#[async_trait]
impl CommandHandler for ScrollHandler {
    fn name(&self) -> &str {
        "scroll"
    }

    fn description(&self) -> &str {
        "Scroll the page, or a specific element, up or down."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["direction"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::Scroll { direction, index } = command else {
            return CommandResult::failed("scroll handler received a mismatched command");
        };
        match ctx.browser_session.scroll(*direction, *index).await {
            Ok(()) => CommandResult::ok(),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

pub struct SelectHandler;

#[async_trait]
impl CommandHandler for SelectHandler {
    fn name(&self) -> &str {
        "select"
    }

    fn description(&self) -> &str {
        "Set a <select> element's value directly by its option value attribute."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["index", "value"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::Select { index, value } = command else {
            return CommandResult::failed("select handler received a mismatched command");
        };
        match ctx
            .dom_service
            .select_option_by_value(&ctx.page(), &ctx.cdp(), *index, value)
            .await
        {
            Ok(()) => CommandResult::ok(),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

pub struct WaitHandler;

#[async_trait]
impl CommandHandler for WaitHandler {
    fn name(&self) -> &str {
        "wait"
    }

    fn description(&self) -> &str {
        "Pause for the given number of milliseconds."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["ms"]})
    }

    async fn handle(&self, command: &Command, _ctx: &ExecutionContext) -> CommandResult {
        let Command::Wait { ms } = command else {
            return CommandResult::failed("wait handler received a mismatched command");
        };
        let ms = (*ms).max(0) as u64;
        tokio::time::sleep(Duration::from_millis(ms)).await;
        CommandResult::ok()
    }
}

/// Resolve `path` against the sandbox directory: absolute (`/`-prefixed)
/// paths pass through unchanged (§4.4 "upload").
fn resolve_upload_path(file_system: &dyn crate::collaborators::FileAccess, path: &str) -> PathBuf {
    if path.starts_with('/') {
        PathBuf::from(path)
    } else {
        file_system.sandbox_dir().join(path)
    }
}

pub struct UploadHandler;

#[async_trait]
impl CommandHandler for UploadHandler {
    fn name(&self) -> &str {
        "upload"
    }

    fn description(&self) -> &str {
        "Attach a local file to a file input at the given index."
    }

    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["index", "path"]})
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult {
        let Command::Upload { index, path } = command else {
            return CommandResult::failed("upload handler received a mismatched command");
        };
        let Some(file_system) = &ctx.file_system else {
            return CommandResult::failed("no file-access collaborator is configured for this run");
        };
        let resolved = resolve_upload_path(file_system.as_ref(), path);
        match ctx.dom_service.upload_file(&ctx.page(), &ctx.cdp(), *index, &resolved).await {
            Ok(()) => CommandResult::ok(),
            Err(error) => CommandResult::failed(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeFiles;

    #[async_trait]
    impl crate::collaborators::FileAccess for FakeFiles {
        fn sandbox_dir(&self) -> PathBuf {
            PathBuf::from("/sandbox/run-1")
        }
        async fn read(&self, _relative_path: &str) -> crate::error::Result<Vec<u8>> {
            Ok(vec![])
        }
        async fn write(&self, _relative_path: &str, _contents: &[u8]) -> crate::error::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn relative_upload_paths_resolve_under_the_sandbox_dir() {
        let files = FakeFiles;
        let resolved = resolve_upload_path(&files, "downloads/report.pdf");
        assert_eq!(resolved, PathBuf::from("/sandbox/run-1/downloads/report.pdf"));
    }

    #[test]
    fn absolute_upload_paths_pass_through() {
        let files = FakeFiles;
        let resolved = resolve_upload_path(&files, "/tmp/report.pdf");
        assert_eq!(resolved, PathBuf::from("/tmp/report.pdf"));
    }
}
