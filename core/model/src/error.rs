//! Error types for the model-collaborator layer.

use helm_error::ErrorExt;
use helm_error::Location;
use helm_error::StatusCode;
use helm_error::stack_trace_debug;
use snafu::Snafu;
use std::time::Duration;

/// Errors surfaced by a [`crate::ModelCollaborator`] invocation (§6, §7).
#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum ApiError {
    /// Network error during a model call.
    #[snafu(display("Network error: {message}"))]
    Network {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// Authentication error.
    #[snafu(display("Authentication failed: {message}"))]
    Authentication {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// Throttled: the collaborator asked the caller to back off, optionally
    /// with an explicit delay (§7 error kind 1, recovered locally, never
    /// counts toward `consecutiveFailures`).
    #[snafu(display("Throttled: {message}"))]
    Throttled {
        message: String,
        retry_after_ms: Option<i64>,
        #[snafu(implicit)]
        location: Location,
    },

    /// Model overloaded.
    #[snafu(display("Model overloaded: {message}"))]
    Overloaded {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// The model's response failed schema validation (§7 error kind 2).
    /// `failing_fields` lists the offending field paths for the re-prompt.
    #[snafu(display("Schema violation: {message}"))]
    SchemaViolation {
        message: String,
        failing_fields: Vec<String>,
        #[snafu(implicit)]
        location: Location,
    },

    /// The model call exceeded its deadline (§7 error kind 3).
    #[snafu(display("Model call timed out after {timeout_ms}ms"))]
    Timeout {
        timeout_ms: i64,
        #[snafu(implicit)]
        location: Location,
    },

    /// Invalid request.
    #[snafu(display("Invalid request: {message}"))]
    InvalidRequest {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// Provider-side error not otherwise classified.
    #[snafu(display("Provider error: {message}"))]
    Provider {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// All retries exhausted.
    #[snafu(display("Retries exhausted after {attempts} attempts: {message}"))]
    RetriesExhausted {
        attempts: i32,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        api_error::NetworkSnafu { message: message.into() }.build()
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        api_error::AuthenticationSnafu { message: message.into() }.build()
    }

    pub fn throttled(message: impl Into<String>, retry_after_ms: Option<i64>) -> Self {
        api_error::ThrottledSnafu {
            message: message.into(),
            retry_after_ms,
        }
        .build()
    }

    pub fn overloaded(message: impl Into<String>) -> Self {
        api_error::OverloadedSnafu { message: message.into() }.build()
    }

    pub fn schema_violation(message: impl Into<String>, failing_fields: Vec<String>) -> Self {
        api_error::SchemaViolationSnafu {
            message: message.into(),
            failing_fields,
        }
        .build()
    }

    pub fn timeout(timeout_ms: i64) -> Self {
        api_error::TimeoutSnafu { timeout_ms }.build()
    }

    pub fn retries_exhausted(attempts: i32, message: impl Into<String>) -> Self {
        api_error::RetriesExhaustedSnafu {
            attempts,
            message: message.into(),
        }
        .build()
    }

    /// Whether this is a schema-violation error, which the Step Loop retries
    /// locally up to twice before bubbling up (§4.1 step 7, §7 error kind 2).
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, ApiError::SchemaViolation { .. })
    }

    pub fn failing_fields(&self) -> &[String] {
        match self {
            ApiError::SchemaViolation { failing_fields, .. } => failing_fields,
            _ => &[],
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Network { .. } | ApiError::Throttled { .. } | ApiError::Overloaded { .. }
        )
    }

    /// Get retry delay hint if available.
    pub fn retry_delay(&self) -> Option<Duration> {
        match self {
            ApiError::Throttled { retry_after_ms: Some(ms), .. } => Some(Duration::from_millis(*ms as u64)),
            _ => None,
        }
    }
}

impl ErrorExt for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Network { .. } => StatusCode::NetworkError,
            ApiError::Authentication { .. } => StatusCode::AuthenticationFailed,
            ApiError::Throttled { .. } => StatusCode::RateLimited,
            ApiError::Overloaded { .. } => StatusCode::ServiceUnavailable,
            ApiError::SchemaViolation { .. } => StatusCode::InvalidArguments,
            ApiError::Timeout { .. } => StatusCode::Timeout,
            ApiError::InvalidRequest { .. } => StatusCode::InvalidRequest,
            ApiError::Provider { .. } => StatusCode::ProviderError,
            ApiError::RetriesExhausted { .. } => StatusCode::NetworkError,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Result type for model-collaborator operations.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::api_error::*;
    use super::*;

    #[test]
    fn throttled_is_retryable_and_never_fatal() {
        let err: ApiError = ThrottledSnafu {
            message: "rate limited",
            retry_after_ms: Some(1500i64),
        }
        .build();
        assert!(err.is_retryable());
        assert_eq!(err.retry_delay(), Some(Duration::from_millis(1500)));
        assert_eq!(err.status_code(), StatusCode::RateLimited);
    }

    #[test]
    fn schema_violation_carries_failing_fields() {
        let err: ApiError = SchemaViolationSnafu {
            message: "missing field",
            failing_fields: vec!["currentState.nextGoal".to_string()],
        }
        .build();
        assert!(err.is_schema_violation());
        assert_eq!(err.failing_fields(), ["currentState.nextGoal"]);
        assert!(!err.is_retryable());
    }

    #[test]
    fn authentication_is_not_retryable() {
        let err: ApiError = AuthenticationSnafu { message: "bad key" }.build();
        assert!(!err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::AuthenticationFailed);
    }
}
