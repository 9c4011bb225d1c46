//! Scripted collaborators for `--dry-run` (§10.4/§10.5): a model that always
//! proposes `done`, and a browser/page-analyzer/file-access trio that never
//! touches the network or disk. Mirrors the `ScriptedCollaborator` pattern
//! `helm-model` tests itself against.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use helm_commands::BrowserCollaborator;
use helm_commands::BrowserState;
use helm_commands::CdpHandle;
use helm_commands::ElementCandidate;
use helm_commands::FileAccess;
use helm_commands::PageAnalysis;
use helm_commands::PageAnalyzer;
use helm_commands::PageHandle;
use helm_commands::Result as CommandResult;
use helm_commands::Screenshot;
use helm_commands::ScrollPosition;
use helm_model::FinishReason;
use helm_model::ModelCollaborator;
use helm_model::ModelRequest;
use helm_model::ModelResponse;
use helm_model::Result as ModelResult;
use helm_protocol::ScrollDirection;

/// A model collaborator that finishes the task on its very first call.
/// Enough to exercise the full supervisor/agent wiring end to end without a
/// live provider.
pub struct DryRunModel {
    model_id: String,
}

impl DryRunModel {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self { model_id: model_id.into() }
    }
}

#[async_trait]
impl ModelCollaborator for DryRunModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn provider(&self) -> &str {
        "dry-run"
    }

    async fn invoke(&self, _request: ModelRequest) -> ModelResult<ModelResponse> {
        Ok(ModelResponse {
            parsed: serde_json::json!({
                "currentState": {
                    "evaluation": "dry-run: nothing to evaluate",
                    "memory": "",
                    "nextGoal": "finish immediately",
                },
                "actions": [{"type": "done", "text": "dry-run complete", "success": true}],
            }),
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
            finish_reason: FinishReason::Stop,
        })
    }
}

/// A browser collaborator that stays on a fixed blank page; `navigate`
/// records the requested URL but never leaves the loopback page.
pub struct DryRunBrowser {
    state: Mutex<BrowserState>,
}

impl DryRunBrowser {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BrowserState {
                url: "about:blank".to_string(),
                title: "dry run".to_string(),
                tabs: vec!["about:blank".to_string()],
            }),
        }
    }
}

impl Default for DryRunBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserCollaborator for DryRunBrowser {
    fn is_connected(&self) -> bool {
        true
    }

    async fn start(&self) -> CommandResult<()> {
        Ok(())
    }

    async fn navigate(&self, url: &str) -> CommandResult<()> {
        if let Ok(mut state) = self.state.lock() {
            state.url = url.to_string();
        }
        Ok(())
    }

    async fn go_back(&self) -> CommandResult<()> {
        Ok(())
    }

    async fn get_state(&self) -> CommandResult<BrowserState> {
        Ok(self.state.lock().map(|guard| guard.clone()).unwrap_or(BrowserState {
            url: "about:blank".to_string(),
            title: "dry run".to_string(),
            tabs: vec![],
        }))
    }

    async fn screenshot(&self, _full_page: bool) -> CommandResult<Screenshot> {
        Ok(Screenshot {
            base64: String::new(),
            width: 0,
            height: 0,
        })
    }

    fn current_page(&self) -> PageHandle {
        Arc::new(())
    }

    fn cdp(&self) -> CdpHandle {
        Arc::new(())
    }

    async fn switch_tab(&self, _index: i64) -> CommandResult<()> {
        Ok(())
    }

    async fn new_tab(&self, _url: Option<&str>) -> CommandResult<()> {
        Ok(())
    }

    async fn close_tab(&self, _index: Option<i64>) -> CommandResult<()> {
        Ok(())
    }

    async fn wait_for_page_ready(&self) -> CommandResult<()> {
        Ok(())
    }

    async fn press_keys(&self, _keys: &str) -> CommandResult<()> {
        Ok(())
    }

    async fn scroll(&self, _direction: ScrollDirection, _index: Option<i64>) -> CommandResult<()> {
        Ok(())
    }

    async fn close(&self) -> CommandResult<()> {
        Ok(())
    }
}

/// A DOM analyzer reporting one empty page, with no interactive elements.
pub struct DryRunAnalyzer;

#[async_trait]
impl PageAnalyzer for DryRunAnalyzer {
    async fn extract_state(&self, _page: &PageHandle, _cdp: &CdpHandle) -> CommandResult<PageAnalysis> {
        Ok(PageAnalysis {
            tree: serde_json::json!({"tag": "body", "children": []}),
            selector_map: serde_json::json!({}),
            element_count: 0,
            scroll_position: ScrollPosition::default(),
            pixels_above: 0,
            pixels_below: 0,
        })
    }

    async fn click_element_by_index(&self, _page: &PageHandle, _cdp: &CdpHandle, _index: i64) -> CommandResult<()> {
        Ok(())
    }

    async fn input_text_by_index(
        &self,
        _page: &PageHandle,
        _cdp: &CdpHandle,
        _index: i64,
        _text: &str,
        _clear_first: bool,
    ) -> CommandResult<()> {
        Ok(())
    }

    fn get_element_selector(&self, _index: i64) -> Option<String> {
        None
    }

    async fn enumerate_candidates(&self, _page: &PageHandle, _cdp: &CdpHandle) -> CommandResult<Vec<ElementCandidate>> {
        Ok(Vec::new())
    }

    async fn page_markdown(&self, _page: &PageHandle, _cdp: &CdpHandle) -> CommandResult<String> {
        Ok(String::new())
    }

    async fn find_text_node(&self, _page: &PageHandle, _cdp: &CdpHandle, _text: &str) -> CommandResult<Option<i64>> {
        Ok(None)
    }

    async fn scroll_into_view(&self, _page: &PageHandle, _cdp: &CdpHandle, _index: i64) -> CommandResult<()> {
        Ok(())
    }

    async fn list_select_options(&self, _page: &PageHandle, _cdp: &CdpHandle, _index: i64) -> CommandResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn select_option_by_text(&self, _page: &PageHandle, _cdp: &CdpHandle, _index: i64, _option_text: &str) -> CommandResult<()> {
        Ok(())
    }

    async fn select_option_by_value(&self, _page: &PageHandle, _cdp: &CdpHandle, _index: i64, _value: &str) -> CommandResult<()> {
        Ok(())
    }

    async fn upload_file(&self, _page: &PageHandle, _cdp: &CdpHandle, _index: i64, _resolved_path: &Path) -> CommandResult<()> {
        Ok(())
    }
}

/// Scoped file access rooted at a throwaway temp-like directory; reads
/// always miss, writes are dropped.
pub struct DryRunFileAccess {
    sandbox_dir: PathBuf,
}

impl DryRunFileAccess {
    pub fn new(sandbox_dir: PathBuf) -> Self {
        Self { sandbox_dir }
    }
}

#[async_trait]
impl FileAccess for DryRunFileAccess {
    fn sandbox_dir(&self) -> PathBuf {
        self.sandbox_dir.clone()
    }

    async fn read(&self, relative_path: &str) -> CommandResult<Vec<u8>> {
        std::fs::read(self.sandbox_dir.join(relative_path)).map_err(|error| helm_commands::CommandError::Automation {
            category: "file".to_string(),
            message: format!("read {relative_path}: {error}"),
            is_retryable: false,
            location: helm_error::Location::new(file!(), line!(), column!()),
        })
    }

    async fn write(&self, relative_path: &str, contents: &[u8]) -> CommandResult<()> {
        let _ = (relative_path, contents);
        Ok(())
    }
}
