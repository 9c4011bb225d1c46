//! Run-level agent state (§3 Data Model).

use serde::Deserialize;
use serde::Serialize;

/// The Step Loop's mutable run state.
///
/// `consecutive_failures` resets to zero on any successful step;
/// `failure_count` is monotonic for the lifetime of the run (§3 Invariants).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub step: i64,
    pub step_limit: i64,
    pub failure_count: i64,
    pub consecutive_failures: i64,
    pub is_running: bool,
    pub is_paused: bool,
    pub is_done: bool,
    pub current_url: Option<String>,
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub cumulative_cost_usd: f64,
    pub current_plan: Option<String>,
    pub last_plan_step: Option<i64>,
}

impl AgentState {
    pub fn new(step_limit: i64) -> Self {
        Self {
            step: 0,
            step_limit,
            failure_count: 0,
            consecutive_failures: 0,
            is_running: true,
            is_paused: false,
            is_done: false,
            current_url: None,
            total_input_tokens: 0,
            total_output_tokens: 0,
            cumulative_cost_usd: 0.0,
            current_plan: None,
            last_plan_step: None,
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.failure_count += 1;
        self.consecutive_failures += 1;
    }

    pub fn record_usage(&mut self, input_tokens: i64, output_tokens: i64, cost_usd: f64) {
        self.total_input_tokens += input_tokens;
        self.total_output_tokens += output_tokens;
        self.cumulative_cost_usd += cost_usd;
    }

    pub fn step_limit_reached(&self) -> bool {
        self.step >= self.step_limit
    }

    pub fn update_plan(&mut self, plan: impl Into<String>, step: i64) {
        self.current_plan = Some(plan.into());
        self.last_plan_step = Some(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_success_resets_consecutive_failures() {
        let mut state = AgentState::new(10);
        state.record_failure();
        state.record_failure();
        assert_eq!(state.consecutive_failures, 2);
        state.record_success();
        assert_eq!(state.consecutive_failures, 0);
        assert_eq!(state.failure_count, 2, "failure_count stays monotonic");
    }

    #[test]
    fn step_limit_reached_is_inclusive() {
        let mut state = AgentState::new(3);
        state.step = 3;
        assert!(state.step_limit_reached());
        state.step = 2;
        assert!(!state.step_limit_reached());
    }

    #[test]
    fn usage_accumulates_onto_totals() {
        let mut state = AgentState::new(10);
        state.record_usage(100, 20, 0.01);
        state.record_usage(50, 10, 0.005);
        assert_eq!(state.total_input_tokens, 150);
        assert_eq!(state.total_output_tokens, 30);
        assert!((state.cumulative_cost_usd - 0.015).abs() < f64::EPSILON);
    }
}
