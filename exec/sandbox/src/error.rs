//! Errors the Sandbox Supervisor can raise before a [`helm_protocol::sandbox::SandboxResult`]
//! can even be constructed (§4.5) — anything after the browser collaborator
//! is up and the run starts is instead folded into the result's
//! `SandboxError` field.

use helm_error::ErrorExt;
use helm_error::Location;
use helm_error::StatusCode;
use helm_error::stack_trace_debug;
use snafu::Snafu;

#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum SupervisorError {
    /// The browser factory failed to produce a browser collaborator.
    #[snafu(display("Failed to start browser: {message}"))]
    BrowserStartFailed {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for SupervisorError {
    fn status_code(&self) -> StatusCode {
        match self {
            SupervisorError::BrowserStartFailed { .. } => StatusCode::ConnectionFailed,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
