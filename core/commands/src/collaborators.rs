//! The Browser, PageAnalyzer, and FileAccess consumed contracts (§6).
//!
//! The browser driver and DOM renderer are deliberately out of scope (§1);
//! these traits are the seam command handlers are written against. A real
//! implementation wires a CDP-backed driver behind them; tests and
//! `--dry-run` wire scripted fakes instead.
//!
//! `Page` and `CdpSession` are opaque handles: their concrete shape is a
//! browser-driver implementation detail this core never inspects, only
//! threads through to [`PageAnalyzer`].

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

pub type PageHandle = Arc<dyn Any + Send + Sync>;
pub type CdpHandle = Arc<dyn Any + Send + Sync>;

/// `browser.getState()` (§6).
#[derive(Debug, Clone)]
pub struct BrowserState {
    pub url: String,
    pub title: String,
    pub tabs: Vec<String>,
}

/// `browser.screenshot()` (§6).
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub base64: String,
    pub width: i64,
    pub height: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollPosition {
    pub x: i64,
    pub y: i64,
}

/// `PageAnalyzer.extractState()` (§6).
#[derive(Debug, Clone)]
pub struct PageAnalysis {
    pub tree: serde_json::Value,
    pub selector_map: serde_json::Value,
    pub element_count: i64,
    pub scroll_position: ScrollPosition,
    pub pixels_above: i64,
    pub pixels_below: i64,
}

/// The consumed contract for the browser session a run drives (§6).
#[async_trait]
pub trait BrowserCollaborator: Send + Sync {
    fn is_connected(&self) -> bool;
    async fn start(&self) -> Result<()>;
    async fn navigate(&self, url: &str) -> Result<()>;
    async fn go_back(&self) -> Result<()>;
    async fn get_state(&self) -> Result<BrowserState>;
    async fn screenshot(&self, full_page: bool) -> Result<Screenshot>;
    fn current_page(&self) -> PageHandle;
    fn cdp(&self) -> CdpHandle;
    async fn switch_tab(&self, index: i64) -> Result<()>;
    async fn new_tab(&self, url: Option<&str>) -> Result<()>;
    async fn close_tab(&self, index: Option<i64>) -> Result<()>;
    async fn wait_for_page_ready(&self) -> Result<()>;
    async fn press_keys(&self, keys: &str) -> Result<()>;
    async fn scroll(&self, direction: helm_protocol::ScrollDirection, index: Option<i64>) -> Result<()>;
    async fn close(&self) -> Result<()>;
}

/// One candidate element surfaced by [`PageAnalyzer::enumerate_candidates`],
/// the raw material `find`'s query matching runs over.
#[derive(Debug, Clone)]
pub struct ElementCandidate {
    pub index: i64,
    pub tag: String,
    pub attrs: String,
    pub text: String,
    pub aria_label: Option<String>,
    pub placeholder: Option<String>,
    pub title: Option<String>,
}

/// The consumed contract for DOM extraction and index-addressed interaction
/// (§6).
#[async_trait]
pub trait PageAnalyzer: Send + Sync {
    async fn extract_state(&self, page: &PageHandle, cdp: &CdpHandle) -> Result<PageAnalysis>;
    async fn click_element_by_index(&self, page: &PageHandle, cdp: &CdpHandle, index: i64) -> Result<()>;
    async fn input_text_by_index(
        &self,
        page: &PageHandle,
        cdp: &CdpHandle,
        index: i64,
        text: &str,
        clear_first: bool,
    ) -> Result<()>;
    fn get_element_selector(&self, index: i64) -> Option<String>;

    /// The curated interactive/content selector set `find` matches against.
    async fn enumerate_candidates(&self, page: &PageHandle, cdp: &CdpHandle) -> Result<Vec<ElementCandidate>>;

    /// A markdown rendering of the current page, used by `extract` and
    /// `read_page`.
    async fn page_markdown(&self, page: &PageHandle, cdp: &CdpHandle) -> Result<String>;

    /// Walk text nodes for the first node containing `text`, returning its
    /// index if found.
    async fn find_text_node(&self, page: &PageHandle, cdp: &CdpHandle, text: &str) -> Result<Option<i64>>;

    /// Scroll the element at `index`'s parent into view with smooth
    /// behaviour.
    async fn scroll_into_view(&self, page: &PageHandle, cdp: &CdpHandle, index: i64) -> Result<()>;

    /// The visible option text of a `<select>` at `index`.
    async fn list_select_options(&self, page: &PageHandle, cdp: &CdpHandle, index: i64) -> Result<Vec<String>>;

    /// Select a `<select>` option at `index` by its visible text.
    async fn select_option_by_text(&self, page: &PageHandle, cdp: &CdpHandle, index: i64, option_text: &str) -> Result<()>;

    /// Set a `<select>`'s value directly by its `value` attribute.
    async fn select_option_by_value(&self, page: &PageHandle, cdp: &CdpHandle, index: i64, value: &str) -> Result<()>;

    /// Attach a local file to a file input at `index`.
    async fn upload_file(&self, page: &PageHandle, cdp: &CdpHandle, index: i64, resolved_path: &std::path::Path) -> Result<()>;
}

/// The consumed contract for scoped file access within the sandbox directory
/// (§6).
#[async_trait]
pub trait FileAccess: Send + Sync {
    fn sandbox_dir(&self) -> std::path::PathBuf;
    async fn read(&self, relative_path: &str) -> Result<Vec<u8>>;
    async fn write(&self, relative_path: &str, contents: &[u8]) -> Result<()>;
}
