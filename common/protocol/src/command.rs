//! The command catalog's closed set of browser actions (§3 Data Model, §4.4).

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// A command emitted by the model, discriminated on `action`.
///
/// Closed-set variants cover the catalog named in the spec; `Custom` carries
/// any registered custom variant by name so the catalog can grow without a
/// breaking change to this enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    Tap { index: i64 },
    TypeText { index: i64, text: String },
    Navigate { url: String },
    Back,
    Scroll { direction: ScrollDirection, index: Option<i64> },
    PressKeys { keys: String },
    Extract { query: String, schema: Option<Value> },
    Finish { text: String, success: Option<bool> },
    FocusTab { index: i64 },
    NewTab { url: Option<String> },
    CloseTab { index: Option<i64> },
    WebSearch { query: String },
    Upload { index: i64, path: String },
    Select { index: i64, value: String },
    Capture { full_page: Option<bool> },
    ReadPage,
    Wait { ms: i64 },
    ScrollTo { text: String },
    Find { query: String },
    Search { query: String },
    ListOptions { index: i64 },
    PickOption { index: i64, text: String },
    ExtractStructured { query: String, schema: Value },
    #[serde(untagged)]
    Custom(CustomCommand),
}

/// A command whose action name was registered at runtime rather than being
/// one of the closed-set variants above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomCommand {
    pub action: String,
    #[serde(flatten)]
    pub params: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl Command {
    /// The discriminator string used for fingerprinting, catalog lookup, and
    /// history rendering.
    pub fn action_name(&self) -> &str {
        match self {
            Self::Tap { .. } => "tap",
            Self::TypeText { .. } => "type_text",
            Self::Navigate { .. } => "navigate",
            Self::Back => "back",
            Self::Scroll { .. } => "scroll",
            Self::PressKeys { .. } => "press_keys",
            Self::Extract { .. } => "extract",
            Self::Finish { .. } => "finish",
            Self::FocusTab { .. } => "focus_tab",
            Self::NewTab { .. } => "new_tab",
            Self::CloseTab { .. } => "close_tab",
            Self::WebSearch { .. } => "web_search",
            Self::Upload { .. } => "upload",
            Self::Select { .. } => "select",
            Self::Capture { .. } => "capture",
            Self::ReadPage => "read_page",
            Self::Wait { .. } => "wait",
            Self::ScrollTo { .. } => "scroll_to",
            Self::Find { .. } => "find",
            Self::Search { .. } => "search",
            Self::ListOptions { .. } => "list_options",
            Self::PickOption { .. } => "pick_option",
            Self::ExtractStructured { .. } => "extract_structured",
            Self::Custom(c) => &c.action,
        }
    }
}

/// The outcome of executing a single [`Command`] (§3 Data Model).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_content: Option<String>,
    pub is_done: bool,
    pub include_in_memory: bool,
}

impl CommandResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            include_in_memory: true,
            ..Default::default()
        }
    }

    pub fn ok_with_content(content: impl Into<String>) -> Self {
        Self {
            success: true,
            extracted_content: Some(content.into()),
            include_in_memory: true,
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            include_in_memory: true,
            ..Default::default()
        }
    }

    pub fn done(text: impl Into<String>, success: bool) -> Self {
        Self {
            success,
            extracted_content: Some(text.into()),
            is_done: true,
            include_in_memory: true,
            ..Default::default()
        }
    }
}
