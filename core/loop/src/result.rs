//! The Step Loop's terminal result (§3 Data Model, §4.1).

use helm_protocol::StepRecord;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// The outcome of one [`crate::Agent::run`] call.
///
/// `history` is the full per-step log regardless of how the run ended;
/// `errors` accumulates human-readable messages for every recovered or
/// terminal failure along the way, not just the one that ended the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_result: Option<Value>,
    pub success: bool,
    pub history: Vec<StepRecord>,
    pub errors: Vec<String>,
    pub total_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judgement: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simple_judgement: Option<Value>,
}

impl RunOutcome {
    pub fn new() -> Self {
        Self::default()
    }
}
