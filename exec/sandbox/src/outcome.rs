//! Outcome classification (§4.5 step 6): turning whichever branch of the
//! supervisor's race won into a [`SandboxResult`].

use helm_protocol::sandbox::SandboxError;
use helm_protocol::sandbox::SandboxErrorCategory;

/// Classify a raw failure message into one of the fixed sandbox error
/// categories. Timeout and OOM are detected by the race itself rather than
/// by text matching; this only has to disambiguate the remaining causes.
pub fn classify_error(raw_message: &str) -> SandboxErrorCategory {
    let lower = raw_message.to_lowercase();
    if lower.contains("target closed") || lower.contains("target crashed") || lower.contains("session closed") {
        SandboxErrorCategory::Crash
    } else if lower.contains("net::err") || lower.contains("connection") || lower.contains("dns") {
        SandboxErrorCategory::BrowserError
    } else {
        SandboxErrorCategory::AgentError
    }
}

pub fn timeout_error(timeout_ms: u64) -> SandboxError {
    SandboxError {
        category: SandboxErrorCategory::Timeout,
        message: format!("run exceeded its {timeout_ms}ms timeout"),
        stack: None,
    }
}

pub fn oom_error(max_memory_mb: u64) -> SandboxError {
    SandboxError {
        category: SandboxErrorCategory::Oom,
        message: format!("run exceeded its {max_memory_mb}MB memory cap"),
        stack: None,
    }
}

pub fn agent_error(message: impl Into<String>) -> SandboxError {
    let message = message.into();
    SandboxError {
        category: classify_error(&message),
        message,
        stack: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crash_phrases_classify_as_crash() {
        assert_eq!(classify_error("Protocol error: Target closed."), SandboxErrorCategory::Crash);
    }

    #[test]
    fn network_phrases_classify_as_browser_error() {
        assert_eq!(classify_error("net::ERR_CONNECTION_RESET"), SandboxErrorCategory::BrowserError);
    }

    #[test]
    fn unmatched_messages_classify_as_agent_error() {
        assert_eq!(classify_error("run stalled: repeated action"), SandboxErrorCategory::AgentError);
    }
}
