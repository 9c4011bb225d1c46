//! Errors surfaced by command dispatch and execution (§4.4, §7).

use helm_error::ErrorExt;
use helm_error::Location;
use helm_error::StatusCode;
use helm_error::stack_trace_debug;
use snafu::Snafu;

#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum CommandError {
    /// No catalog entry matches the command's action name.
    #[snafu(display("Unknown command: {action}"))]
    UnknownCommand {
        action: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// The command's parameters failed the entry's schema.
    #[snafu(display("Schema violation for {action}: {message}"))]
    SchemaViolation {
        action: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// A navigation target was rejected by the allow/block domain policy
    /// (§4.4 URL policy).
    #[snafu(display("URL blocked: {url}"))]
    UrlBlocked {
        url: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// The browser/page surface crashed or was closed mid-command.
    #[snafu(display("Target crashed: {message}"))]
    TargetCrashed {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// A navigation attempt failed (DNS, connection refused, bad redirect).
    #[snafu(display("Navigation failed for {url}: {message}"))]
    NavigationFailed {
        url: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// Any other classified automation failure (§4.4 error classification).
    #[snafu(display("{category}: {message}"))]
    Automation {
        category: String,
        message: String,
        is_retryable: bool,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for CommandError {
    fn status_code(&self) -> StatusCode {
        match self {
            CommandError::UnknownCommand { .. } => StatusCode::InvalidArguments,
            CommandError::SchemaViolation { .. } => StatusCode::InvalidArguments,
            CommandError::UrlBlocked { .. } => StatusCode::UrlBlocked,
            CommandError::TargetCrashed { .. } => StatusCode::TargetCrashed,
            CommandError::NavigationFailed { .. } => StatusCode::ConnectionFailed,
            CommandError::Automation { is_retryable, .. } => {
                if *is_retryable {
                    StatusCode::ResourcesExhausted
                } else {
                    StatusCode::Unknown
                }
            }
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            CommandError::Automation { is_retryable, .. } => *is_retryable,
            CommandError::NavigationFailed { .. } => true,
            _ => false,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::command_error::*;
    use super::*;

    #[test]
    fn url_blocked_is_not_retryable() {
        let err: CommandError = UrlBlockedSnafu {
            url: "https://blocked.example",
        }
        .build();
        assert!(!err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::UrlBlocked);
    }

    #[test]
    fn automation_retryability_is_per_category() {
        let retryable: CommandError = AutomationSnafu {
            category: "navigation",
            message: "net::ERR_TIMED_OUT",
            is_retryable: true,
        }
        .build();
        assert!(retryable.is_retryable());

        let terminal: CommandError = AutomationSnafu {
            category: "crash",
            message: "target closed",
            is_retryable: false,
        }
        .build();
        assert!(!terminal.is_retryable());
    }
}
