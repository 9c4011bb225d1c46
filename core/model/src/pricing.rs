//! Per-model cost-table lookup (§4.1 step 8, §8 Cost property).
//!
//! Lookup is longest-prefix match on model id so a single entry like
//! `"gpt-4o"` also prices `"gpt-4o-2024-08-06"`; an unrecognised model
//! prices at zero rather than erroring, since cost accounting is
//! best-effort telemetry, not a gate on the run.

use std::collections::BTreeMap;

/// Per-million-token USD rates for one model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelRate {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// An immutable table of model-id-prefix → rate, initialised once at startup
/// (§9 Global state: "the optional pricing table are effectively immutable
/// singletons initialised at startup").
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    rates: BTreeMap<String, ModelRate>,
}

impl PricingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, model_prefix: impl Into<String>, rate: ModelRate) -> Self {
        self.rates.insert(model_prefix.into(), rate);
        self
    }

    /// Find the longest registered prefix of `model_id` and compute cost;
    /// an unrecognised model returns 0.0 (§8: "unknown model → 0").
    pub fn cost_usd(&self, model_id: &str, input_tokens: i64, output_tokens: i64) -> f64 {
        match self.longest_prefix_match(model_id) {
            Some(rate) => {
                (input_tokens as f64 / 1_000_000.0) * rate.input_per_million
                    + (output_tokens as f64 / 1_000_000.0) * rate.output_per_million
            }
            None => 0.0,
        }
    }

    fn longest_prefix_match(&self, model_id: &str) -> Option<ModelRate> {
        self.rates
            .iter()
            .filter(|(prefix, _)| model_id.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, rate)| *rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PricingTable {
        PricingTable::new()
            .with_rate(
                "gpt-4o",
                ModelRate {
                    input_per_million: 2.5,
                    output_per_million: 10.0,
                },
            )
            .with_rate(
                "gpt-4o-mini",
                ModelRate {
                    input_per_million: 0.15,
                    output_per_million: 0.6,
                },
            )
    }

    #[test]
    fn longest_prefix_wins_over_shorter_match() {
        let table = table();
        let cost = table.cost_usd("gpt-4o-mini-2024-07-18", 1_000_000, 1_000_000);
        assert!((cost - (0.15 + 0.6)).abs() < f64::EPSILON);
    }

    #[test]
    fn shorter_prefix_still_matches_when_longer_absent() {
        let table = table();
        let cost = table.cost_usd("gpt-4o-2024-08-06", 1_000_000, 0);
        assert!((cost - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_model_costs_zero() {
        let table = table();
        assert_eq!(table.cost_usd("some-other-model", 1_000_000, 1_000_000), 0.0);
    }

    #[test]
    fn cost_scales_linearly_with_tokens() {
        let table = table();
        let cost = table.cost_usd("gpt-4o", 500_000, 250_000);
        assert!((cost - (1.25 + 2.5)).abs() < 1e-9);
    }
}
