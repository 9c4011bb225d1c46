//! Cost-budget data shapes (§3 Data Model, §4.1 step 8).
//!
//! This type only carries configuration and observed state; the
//! threshold-crossing and exhaustion logic that consumes it lives in the
//! context crate, which owns the callback wiring.

use serde::Deserialize;
use serde::Serialize;

/// A USD cost ceiling for a run, with sorted fractional checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    pub max_cost_usd: f64,
    /// Sorted ascending, each in (0, 1]. e.g. `[0.5, 0.8, 1.0]`.
    pub thresholds: Vec<f64>,
}

impl BudgetConfig {
    pub fn new(max_cost_usd: f64, mut thresholds: Vec<f64>) -> Self {
        thresholds.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Self {
            max_cost_usd,
            thresholds,
        }
    }
}

/// The Budget's mutable observed state: current spend and which thresholds
/// have already fired, so callbacks run exactly once per threshold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetState {
    pub current_cost_usd: f64,
    pub crossed_thresholds: Vec<f64>,
}

impl BudgetState {
    pub fn fraction_spent(&self, config: &BudgetConfig) -> f64 {
        if config.max_cost_usd <= 0.0 {
            return 0.0;
        }
        self.current_cost_usd / config.max_cost_usd
    }

    pub fn is_exhausted(&self, config: &BudgetConfig) -> bool {
        config.max_cost_usd > 0.0 && self.current_cost_usd >= config.max_cost_usd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_sorted_on_construction() {
        let config = BudgetConfig::new(10.0, vec![0.8, 0.5, 1.0]);
        assert_eq!(config.thresholds, vec![0.5, 0.8, 1.0]);
    }

    #[test]
    fn fraction_spent_divides_by_max_cost() {
        let config = BudgetConfig::new(10.0, vec![0.5]);
        let mut state = BudgetState::default();
        state.current_cost_usd = 5.0;
        assert!((state.fraction_spent(&config) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn exhausted_requires_reaching_max_cost() {
        let config = BudgetConfig::new(10.0, vec![]);
        let mut state = BudgetState::default();
        state.current_cost_usd = 9.99;
        assert!(!state.is_exhausted(&config));
        state.current_cost_usd = 10.0;
        assert!(state.is_exhausted(&config));
    }
}
