//! The `ModelCollaborator` consumed contract (§6).
//!
//! The core never talks HTTP to a provider directly — that client is an
//! external collaborator supplied by the embedding application. This trait
//! is the seam: anything implementing it (a real provider client, or the
//! scripted fake used for tests/`--dry-run`) can drive the Step Loop.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// One model invocation request (§6).
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub messages: Vec<helm_protocol::Message>,
    pub response_schema: Value,
    pub schema_name: String,
    pub schema_description: Option<String>,
    pub max_tokens: Option<i64>,
    pub temperature: Option<f64>,
}

/// Why the model stopped producing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolUse,
}

/// The result of a successful [`ModelCollaborator::invoke`] call (§6).
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub parsed: Value,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
    pub finish_reason: FinishReason,
}

/// The consumed contract for a model provider (§6 External Interfaces).
///
/// Implementations must surface [`crate::ApiError::Throttled`] (with an
/// optional `retry_after_ms`) rather than a generic network error when the
/// provider signals backpressure, and [`crate::ApiError::SchemaViolation`]
/// (with `failing_fields` populated) when the response doesn't match the
/// requested schema — the Step Loop's recovery policy (§4.1 step 7) depends
/// on being able to distinguish these from other failures.
#[async_trait]
pub trait ModelCollaborator: Send + Sync {
    /// A stable identifier used for history rendering and pricing lookup.
    fn model_id(&self) -> &str;

    fn provider(&self) -> &str;

    async fn invoke(&self, request: ModelRequest) -> Result<ModelResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use helm_protocol::Message;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    struct ScriptedCollaborator {
        model_id: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelCollaborator for ScriptedCollaborator {
        fn model_id(&self) -> &str {
            &self.model_id
        }

        fn provider(&self) -> &str {
            "scripted"
        }

        async fn invoke(&self, _request: ModelRequest) -> Result<ModelResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ModelResponse {
                parsed: serde_json::json!({"currentState": {"evaluation": "ok", "memory": "", "nextGoal": ""}, "actions": []}),
                input_tokens: 10,
                output_tokens: 5,
                total_tokens: 15,
                finish_reason: FinishReason::Stop,
            })
        }
    }

    #[tokio::test]
    async fn scripted_collaborator_satisfies_the_trait() {
        let collaborator = ScriptedCollaborator {
            model_id: "test-model".to_string(),
            calls: AtomicUsize::new(0),
        };
        let request = ModelRequest {
            messages: vec![Message::user("go")],
            response_schema: serde_json::json!({}),
            schema_name: "standard".to_string(),
            schema_description: None,
            max_tokens: None,
            temperature: None,
        };
        let response = collaborator.invoke(request).await.expect("invoke");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(collaborator.calls.load(Ordering::SeqCst), 1);
    }
}
