//! Raw-error classification (§4.4 "Error classification").
//!
//! Most handler failures arrive as a free-text message from the browser
//! driver; this module matches that text against an ordered pattern table to
//! produce a human-facing category, message, suggestion, and retryability.
//! Dedicated error types ([`crate::error::CommandError`]) bypass the table
//! entirely and carry their classification directly.

/// One of the fixed categories a raw automation failure can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Navigation,
    Network,
    Timeout,
    ElementNotFound,
    ElementNotInteractable,
    ElementStale,
    Crash,
    Permission,
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::ElementNotFound => "element_not_found",
            Self::ElementNotInteractable => "element_not_interactable",
            Self::ElementStale => "element_stale",
            Self::Crash => "crash",
            Self::Permission => "permission",
            Self::Other => "other",
        }
    }
}

/// A classified failure ready to surface to the model as an action error.
#[derive(Debug, Clone)]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub message: String,
    pub suggestion: &'static str,
    pub is_retryable: bool,
}

struct Rule {
    pattern: &'static str,
    category: ErrorCategory,
    suggestion: &'static str,
    is_retryable: bool,
}

const RULES: &[Rule] = &[
    Rule {
        pattern: "err_name_not_resolved",
        category: ErrorCategory::Navigation,
        suggestion: "check the URL is correct and reachable",
        is_retryable: true,
    },
    Rule {
        pattern: "err_connection_refused",
        category: ErrorCategory::Network,
        suggestion: "retry once the network is reachable",
        is_retryable: true,
    },
    Rule {
        pattern: "net::err",
        category: ErrorCategory::Network,
        suggestion: "retry or navigate to a different URL",
        is_retryable: true,
    },
    Rule {
        pattern: "timed out",
        category: ErrorCategory::Timeout,
        suggestion: "retry with a longer wait or simpler action",
        is_retryable: true,
    },
    Rule {
        pattern: "timeout",
        category: ErrorCategory::Timeout,
        suggestion: "retry with a longer wait or simpler action",
        is_retryable: true,
    },
    Rule {
        pattern: "no element found",
        category: ErrorCategory::ElementNotFound,
        suggestion: "re-read the page, the index may be stale",
        is_retryable: true,
    },
    Rule {
        pattern: "no node found",
        category: ErrorCategory::ElementNotFound,
        suggestion: "re-read the page, the index may be stale",
        is_retryable: true,
    },
    Rule {
        pattern: "not clickable",
        category: ErrorCategory::ElementNotInteractable,
        suggestion: "scroll the element into view before interacting",
        is_retryable: true,
    },
    Rule {
        pattern: "not interactable",
        category: ErrorCategory::ElementNotInteractable,
        suggestion: "scroll the element into view before interacting",
        is_retryable: true,
    },
    Rule {
        pattern: "element is not attached",
        category: ErrorCategory::ElementStale,
        suggestion: "re-read the page to get a fresh index",
        is_retryable: true,
    },
    Rule {
        pattern: "stale element",
        category: ErrorCategory::ElementStale,
        suggestion: "re-read the page to get a fresh index",
        is_retryable: true,
    },
    Rule {
        pattern: "target closed",
        category: ErrorCategory::Crash,
        suggestion: "the page or tab crashed, consider opening a new tab",
        is_retryable: false,
    },
    Rule {
        pattern: "target crashed",
        category: ErrorCategory::Crash,
        suggestion: "the page or tab crashed, consider opening a new tab",
        is_retryable: false,
    },
    Rule {
        pattern: "session closed",
        category: ErrorCategory::Crash,
        suggestion: "the page or tab crashed, consider opening a new tab",
        is_retryable: false,
    },
    Rule {
        pattern: "permission denied",
        category: ErrorCategory::Permission,
        suggestion: "this action is not permitted in the current sandbox",
        is_retryable: false,
    },
    Rule {
        pattern: "blocked by",
        category: ErrorCategory::Permission,
        suggestion: "this action is not permitted in the current sandbox",
        is_retryable: false,
    },
];

/// Match a raw error message against the ordered pattern table.
pub fn classify(raw_message: &str) -> ClassifiedError {
    let lower = raw_message.to_lowercase();
    for rule in RULES {
        if lower.contains(rule.pattern) {
            return ClassifiedError {
                category: rule.category,
                message: raw_message.to_string(),
                suggestion: rule.suggestion,
                is_retryable: rule.is_retryable,
            };
        }
    }
    ClassifiedError {
        category: ErrorCategory::Other,
        message: raw_message.to_string(),
        suggestion: "retry or try a different approach",
        is_retryable: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_are_retryable() {
        let classified = classify("net::ERR_CONNECTION_RESET while loading");
        assert_eq!(classified.category, ErrorCategory::Network);
        assert!(classified.is_retryable);
    }

    #[test]
    fn crash_is_not_retryable() {
        let classified = classify("Protocol error: Target closed.");
        assert_eq!(classified.category, ErrorCategory::Crash);
        assert!(!classified.is_retryable);
    }

    #[test]
    fn unmatched_messages_fall_back_to_other() {
        let classified = classify("something unexpected happened");
        assert_eq!(classified.category, ErrorCategory::Other);
        assert!(classified.is_retryable);
    }

    #[test]
    fn first_matching_rule_wins() {
        // "timed out" must be checked before the generic "timeout" pattern
        // matches the same substring, but both map to the same category
        // here so this just exercises ordering without divergence.
        let classified = classify("navigation timed out after 30s");
        assert_eq!(classified.category, ErrorCategory::Timeout);
    }
}
