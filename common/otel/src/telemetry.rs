//! Structured, per-run telemetry events (§10.1).
//!
//! Mirrors the reference implementation's pattern of one `tracing::event!`
//! call per domain occurrence with a fixed `event.name` and typed fields,
//! rather than ad hoc string interpolation, so a downstream collector can
//! index on `event.name` consistently.

use tracing::Span;
use tracing::info_span;

/// Carries the identifying fields stamped onto every telemetry event for one
/// run: constructed once, cheap to clone, never mutated.
#[derive(Debug, Clone)]
pub struct RunTelemetry {
    run_id: String,
    model_id: String,
    run_span: Span,
}

impl RunTelemetry {
    pub fn new(run_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        let run_id = run_id.into();
        let model_id = model_id.into();
        let run_span = info_span!("agent_run", run_id = %run_id, model_id = %model_id);
        Self {
            run_id,
            model_id,
            run_span,
        }
    }

    pub fn run_span(&self) -> &Span {
        &self.run_span
    }

    /// A span for one step of the Step Loop; steps nest under [`Self::run_span`].
    pub fn step_span(&self, step: i64) -> Span {
        tracing::info_span!(parent: &self.run_span, "step", step = step)
    }

    pub fn run_started(&self, task: &str, step_limit: i64) {
        tracing::event!(
            tracing::Level::INFO,
            event.name = "helm.run_started",
            run.id = %self.run_id,
            model.id = %self.model_id,
            task = %task,
            step_limit = step_limit,
        );
    }

    pub fn run_completed(&self, success: bool, total_steps: i64, total_cost_usd: f64) {
        tracing::event!(
            tracing::Level::INFO,
            event.name = "helm.run_completed",
            run.id = %self.run_id,
            success = success,
            total_steps = total_steps,
            total_cost_usd = total_cost_usd,
        );
    }

    pub fn step_completed(&self, step: i64, commands_executed: i64, page_changed: bool, duration_ms: i64) {
        tracing::event!(
            tracing::Level::DEBUG,
            event.name = "helm.step_completed",
            run.id = %self.run_id,
            step = step,
            commands_executed = commands_executed,
            page_changed = page_changed,
            duration_ms = duration_ms,
        );
    }

    pub fn step_failed(&self, step: i64, error: &str, consecutive_failures: i64) {
        tracing::event!(
            tracing::Level::WARN,
            event.name = "helm.step_failed",
            run.id = %self.run_id,
            step = step,
            error = %error,
            consecutive_failures = consecutive_failures,
        );
    }

    pub fn stall_detected(&self, step: i64, severity: u8, reason: &str) {
        tracing::event!(
            tracing::Level::WARN,
            event.name = "helm.stall_detected",
            run.id = %self.run_id,
            step = step,
            severity = severity,
            reason = %reason,
        );
    }

    pub fn budget_threshold_crossed(&self, fraction: f64, current_cost_usd: f64) {
        tracing::event!(
            tracing::Level::INFO,
            event.name = "helm.budget_threshold_crossed",
            run.id = %self.run_id,
            fraction = fraction,
            current_cost_usd = current_cost_usd,
        );
    }

    pub fn sandbox_outcome(&self, success: bool, category: Option<&str>, duration_ms: i64, peak_memory_mb: f64) {
        tracing::event!(
            tracing::Level::INFO,
            event.name = "helm.sandbox_outcome",
            run.id = %self.run_id,
            success = success,
            category = category,
            duration_ms = duration_ms,
            peak_memory_mb = peak_memory_mb,
        );
    }
}
