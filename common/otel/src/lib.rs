//! Tracing/OpenTelemetry bridge: process-wide logging init and structured
//! per-run telemetry events (§10.1).

pub mod init;
pub mod telemetry;

pub use init::TelemetryGuard;
pub use init::init_tracing;
pub use telemetry::RunTelemetry;
