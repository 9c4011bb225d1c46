//! The Budget (§3, §4.1 step 8): wraps [`helm_protocol::budget::BudgetConfig`]
//! and [`helm_protocol::budget::BudgetState`] with the threshold-crossing and
//! exhaustion callback wiring those data shapes deliberately leave out.
//!
//! Callbacks fire synchronously, inline with [`Budget::record_cost`] - there
//! is no polling loop. A threshold fires at most once per `Budget` instance;
//! `exhausted` may fire repeatedly if cost keeps accumulating past the cap.

use helm_protocol::budget::BudgetConfig;
use helm_protocol::budget::BudgetState;

/// Called with the threshold fraction (e.g. `0.8`) the first time spend
/// crosses it.
pub type ThresholdCallback = Box<dyn FnMut(f64) + Send>;
/// Called every time `record_cost` observes the budget is exhausted.
pub type ExhaustedCallback = Box<dyn FnMut() + Send>;

/// Tracks cumulative USD cost against a configured ceiling and fires
/// callbacks as checkpoints are crossed.
pub struct Budget {
    config: BudgetConfig,
    state: BudgetState,
    on_threshold_crossed: Option<ThresholdCallback>,
    on_exhausted: Option<ExhaustedCallback>,
}

impl Budget {
    pub fn new(config: BudgetConfig) -> Self {
        Self {
            config,
            state: BudgetState::default(),
            on_threshold_crossed: None,
            on_exhausted: None,
        }
    }

    pub fn with_threshold_callback(mut self, callback: impl FnMut(f64) + Send + 'static) -> Self {
        self.on_threshold_crossed = Some(Box::new(callback));
        self
    }

    pub fn with_exhausted_callback(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_exhausted = Some(Box::new(callback));
        self
    }

    /// Add `cost_usd` to cumulative spend, firing any newly crossed threshold
    /// callbacks and the exhausted callback if the ceiling has been reached.
    pub fn record_cost(&mut self, cost_usd: f64) {
        self.state.current_cost_usd += cost_usd;

        let fraction = self.state.fraction_spent(&self.config);
        for &threshold in &self.config.thresholds {
            if fraction < threshold || self.state.crossed_thresholds.contains(&threshold) {
                continue;
            }
            self.state.crossed_thresholds.push(threshold);
            if let Some(callback) = &mut self.on_threshold_crossed {
                callback(threshold);
            }
        }

        if self.state.is_exhausted(&self.config) {
            if let Some(callback) = &mut self.on_exhausted {
                callback();
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.state.is_exhausted(&self.config)
    }

    pub fn fraction_spent(&self) -> f64 {
        self.state.fraction_spent(&self.config)
    }

    pub fn state(&self) -> &BudgetState {
        &self.state
    }

    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Restore a previously saved state, e.g. after resuming a run.
    pub fn restore(&mut self, state: BudgetState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;

    #[test]
    fn fires_each_threshold_exactly_once() {
        let crossed = Arc::new(Mutex::new(Vec::new()));
        let crossed_clone = crossed.clone();
        let mut budget = Budget::new(BudgetConfig::new(10.0, vec![0.5, 0.8]))
            .with_threshold_callback(move |t| crossed_clone.lock().expect("lock").push(t));

        budget.record_cost(4.0);
        assert!(crossed.lock().expect("lock").is_empty());

        budget.record_cost(2.0); // 6.0 / 10.0 = 0.6, crosses 0.5
        assert_eq!(*crossed.lock().expect("lock"), vec![0.5]);

        budget.record_cost(3.0); // 9.0 / 10.0 = 0.9, crosses 0.8
        assert_eq!(*crossed.lock().expect("lock"), vec![0.5, 0.8]);

        budget.record_cost(0.5); // still above 0.8, no new callback
        assert_eq!(*crossed.lock().expect("lock"), vec![0.5, 0.8]);
    }

    #[test]
    fn exhausted_callback_fires_once_cap_is_reached() {
        let count = Arc::new(Mutex::new(0));
        let count_clone = count.clone();
        let mut budget =
            Budget::new(BudgetConfig::new(5.0, vec![])).with_exhausted_callback(move || {
                *count_clone.lock().expect("lock") += 1;
            });

        budget.record_cost(4.0);
        assert!(!budget.is_exhausted());
        assert_eq!(*count.lock().expect("lock"), 0);

        budget.record_cost(1.0);
        assert!(budget.is_exhausted());
        assert_eq!(*count.lock().expect("lock"), 1);

        budget.record_cost(1.0);
        assert_eq!(*count.lock().expect("lock"), 2);
    }

    #[test]
    fn zero_cost_budget_is_never_exhausted() {
        let budget = Budget::new(BudgetConfig::new(0.0, vec![]));
        assert!(!budget.is_exhausted());
    }
}
