//! Terminal errors the Step Loop can stop a run with (§4.1, §7).

use helm_error::ErrorExt;
use helm_error::Location;
use helm_error::StatusCode;
use helm_error::stack_trace_debug;
use snafu::Snafu;

#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum AgentError {
    /// The Stall Detector reached its most severe escalation tier.
    #[snafu(display("Run stalled: {reason}"))]
    Stalled {
        reason: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// The run reached its configured step limit without finishing.
    #[snafu(display("Step limit of {step_limit} reached without finishing"))]
    StepLimitExceeded {
        step_limit: i64,
        #[snafu(implicit)]
        location: Location,
    },

    /// Consecutive step failures crossed the configured threshold.
    #[snafu(display("Consecutive failures ({consecutive_failures}) crossed the threshold: {message}"))]
    FailureThresholdExceeded {
        consecutive_failures: i64,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// The model collaborator returned a non-recoverable error.
    #[snafu(display("Model call failed: {source}"))]
    Model {
        source: helm_model::ApiError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for AgentError {
    fn status_code(&self) -> StatusCode {
        match self {
            AgentError::Stalled { .. } => StatusCode::Stalled,
            AgentError::StepLimitExceeded { .. } => StatusCode::StepLimitExceeded,
            AgentError::FailureThresholdExceeded { .. } => StatusCode::FailureThresholdExceeded,
            AgentError::Model { source, .. } => source.status_code(),
        }
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
