//! The command handler's `ExecutionContext` (§4.4 "Dispatch").

use std::sync::Arc;

use helm_message::MaskedValue;
use helm_model::ModelCollaborator;

use crate::collaborators::BrowserCollaborator;
use crate::collaborators::CdpHandle;
use crate::collaborators::FileAccess;
use crate::collaborators::PageAnalyzer;
use crate::collaborators::PageHandle;

/// Everything a command handler needs to act on the current page (§4.4:
/// `{ page, cdpSession, domService, browserSession, extractionLlm?,
/// fileSystem?, maskedValues? }`).
///
/// `page`/`cdpSession` are fetched fresh from the browser collaborator on
/// every dispatch rather than cached, since a prior command in the same
/// sequence may have navigated or switched tabs.
#[derive(Clone)]
pub struct ExecutionContext {
    pub browser_session: Arc<dyn BrowserCollaborator>,
    pub dom_service: Arc<dyn PageAnalyzer>,
    pub extraction_llm: Option<Arc<dyn ModelCollaborator>>,
    pub file_system: Option<Arc<dyn FileAccess>>,
    pub masked_values: Vec<MaskedValue>,
    pub allowed_domains: Vec<String>,
    pub blocked_domains: Vec<String>,
}

impl ExecutionContext {
    pub fn new(browser_session: Arc<dyn BrowserCollaborator>, dom_service: Arc<dyn PageAnalyzer>) -> Self {
        Self {
            browser_session,
            dom_service,
            extraction_llm: None,
            file_system: None,
            masked_values: Vec::new(),
            allowed_domains: Vec::new(),
            blocked_domains: Vec::new(),
        }
    }

    pub fn with_extraction_llm(mut self, model: Arc<dyn ModelCollaborator>) -> Self {
        self.extraction_llm = Some(model);
        self
    }

    pub fn with_file_system(mut self, file_system: Arc<dyn FileAccess>) -> Self {
        self.file_system = Some(file_system);
        self
    }

    pub fn with_masked_values(mut self, masked_values: Vec<MaskedValue>) -> Self {
        self.masked_values = masked_values;
        self
    }

    pub fn with_url_policy(mut self, allowed: Vec<String>, blocked: Vec<String>) -> Self {
        self.allowed_domains = allowed;
        self.blocked_domains = blocked;
        self
    }

    pub fn page(&self) -> PageHandle {
        self.browser_session.current_page()
    }

    pub fn cdp(&self) -> CdpHandle {
        self.browser_session.cdp()
    }

    pub fn is_url_permitted(&self, url: &str) -> bool {
        helm_protocol::is_url_permitted(url, &self.allowed_domains, &self.blocked_domains)
    }
}
