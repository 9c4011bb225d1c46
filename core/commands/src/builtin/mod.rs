//! The built-in command handler set (§4.4 "Catalog") covering every
//! closed-set [`helm_protocol::Command`] variant.

pub mod content;
pub mod interaction;
pub mod navigation;
pub mod options;
pub mod search;

use crate::catalog::CommandCatalog;

/// A [`CommandCatalog`] pre-registered with every built-in handler.
pub fn default_catalog() -> CommandCatalog {
    let mut catalog = CommandCatalog::new();

    catalog.register(navigation::NavigateHandler);
    catalog.register(navigation::BackHandler);
    catalog.register(navigation::FocusTabHandler);
    catalog.register(navigation::NewTabHandler);
    catalog.register(navigation::CloseTabHandler);
    catalog.register(navigation::WebSearchHandler);

    catalog.register(interaction::TapHandler);
    catalog.register(interaction::TypeTextHandler);
    catalog.register(interaction::PressKeysHandler);
    catalog.register(interaction::ScrollHandler);
    catalog.register(interaction::SelectHandler);
    catalog.register(interaction::WaitHandler);
    catalog.register(interaction::UploadHandler);

    catalog.register(content::ExtractHandler);
    catalog.register(content::ExtractStructuredHandler);
    catalog.register(content::ReadPageHandler);
    catalog.register(content::CaptureHandler);
    catalog.register(content::FinishHandler);

    catalog.register(search::FindHandler);
    catalog.register(search::SearchHandler);
    catalog.register(search::ScrollToHandler);

    catalog.register(options::ListOptionsHandler);
    catalog.register(options::PickOptionHandler);

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_registers_every_closed_set_command() {
        let catalog = default_catalog();
        let expected = [
            "back",
            "capture",
            "close_tab",
            "extract",
            "extract_structured",
            "find",
            "finish",
            "focus_tab",
            "list_options",
            "navigate",
            "new_tab",
            "pick_option",
            "press_keys",
            "read_page",
            "scroll",
            "scroll_to",
            "search",
            "select",
            "tap",
            "type_text",
            "upload",
            "wait",
            "web_search",
        ];
        assert_eq!(catalog.names(), expected.to_vec());
    }

    #[test]
    fn finish_is_the_only_terminating_handler() {
        let catalog = default_catalog();
        for name in catalog.names() {
            let expects_terminate = name == "finish";
            assert_eq!(catalog.terminates_sequence(&name), expects_terminate, "{name}");
        }
    }
}
