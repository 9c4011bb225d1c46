//! The Sandbox Supervisor (§4.5 of the agent engine): runs one task end to
//! end under resource caps, always returning a `SandboxResult` rather than a
//! Rust error - construction failures, timeouts, OOM, and agent-level
//! failures all flow through the same result type.

pub mod error;
pub mod monitor;
pub mod outcome;
pub mod output;
pub mod supervisor;

pub use error::SupervisorError;
pub use monitor::ResourceMonitor;
pub use output::OutputCapture;
pub use supervisor::BrowserFactory;
pub use supervisor::SandboxSupervisor;
pub use supervisor::SandboxSupervisorBuilder;

pub use helm_protocol::sandbox::CapturedOutput;
pub use helm_protocol::sandbox::SandboxConfig;
pub use helm_protocol::sandbox::SandboxError;
pub use helm_protocol::sandbox::SandboxErrorCategory;
pub use helm_protocol::sandbox::SandboxMetrics;
pub use helm_protocol::sandbox::SandboxResult;
