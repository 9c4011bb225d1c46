//! helm-loop - the Step Loop (§4.1).
//!
//! Drives one run of the agent: per-step browser snapshot, stall check,
//! model invocation with schema selection and recovery, command-sequence
//! execution, stall-detector and cost bookkeeping, planning cadence, and
//! LLM compaction, until the model signals completion, a terminal error is
//! reached, or the step limit runs out.
//!
//! # Module structure
//!
//! - [`agent`] - `Agent`/`AgentBuilder`, the driver itself
//! - [`schema`] - response schema selection and decision normalisation
//! - [`planner`] - plan-update cadence
//! - [`judge`] - the optional simple judge call
//! - [`preflight`] - auto-navigate and configured preflight commands
//! - [`result`] - `RunOutcome`
//! - [`error`] - terminal `AgentError`

pub mod agent;
pub mod error;
pub mod judge;
pub mod planner;
pub mod preflight;
pub mod result;
pub mod schema;

pub use agent::Agent;
pub use agent::AgentBuilder;
pub use agent::AgentHandle;
pub use error::AgentError;
pub use error::Result;
pub use result::RunOutcome;
pub use schema::Decision;
pub use schema::SchemaKind;

pub use helm_config::LoopConfig;
