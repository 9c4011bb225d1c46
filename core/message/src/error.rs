//! Error types for the Conversation Manager.

use helm_error::ErrorExt;
use helm_error::Location;
use helm_error::StatusCode;
use helm_error::stack_trace_debug;
use snafu::Snafu;

/// Errors surfaced by [`crate::conversation::ConversationManager`] (§4.2, §6).
#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum ConversationError {
    /// Failed to read or write a persisted snapshot.
    #[snafu(display("Conversation persistence I/O error: {message}"))]
    Io {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// A persisted snapshot did not parse as valid JSON.
    #[snafu(display("Conversation snapshot parse error: {message}"))]
    Parse {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for ConversationError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Io { .. } => StatusCode::IoError,
            Self::Parse { .. } => StatusCode::InvalidJson,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, ConversationError>;
