//! Planning cadence (§4.1 "Planning cadence"): when to ask the model for a
//! fresh high-level plan, and the fixed schema that request uses.

use helm_config::LoopConfig;
use serde_json::Value;
use serde_json::json;

/// Whether a plan-update call is due this step.
///
/// Due either on the configured interval (floored at 5 steps) since the
/// last plan, or immediately when the run is stalling badly and
/// `restrategize_on_stall` is set - whichever condition fires first.
pub fn plan_due(config: &LoopConfig, step: i64, last_plan_step: Option<i64>, stall_severity: u8) -> bool {
    if !config.enable_strategy {
        return false;
    }
    let interval = config.strategy_interval.max(5);
    let since_last = step - last_plan_step.unwrap_or(0);
    if since_last >= interval {
        return true;
    }
    config.restrategize_on_stall && stall_severity >= 2
}

/// The fixed `{plan, reasoning}` schema used for plan-update calls.
pub fn plan_schema() -> Value {
    json!({
        "type": "object",
        "required": ["plan", "reasoning"],
        "properties": {
            "plan": {"type": "string"},
            "reasoning": {"type": "string"}
        }
    })
}

/// Extract the `plan` field from a parsed plan-update response.
pub fn extract_plan(parsed: &Value) -> Option<String> {
    parsed.get("plan").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_strategy(interval: i64) -> LoopConfig {
        let mut config = LoopConfig::default();
        config.enable_strategy = true;
        config.strategy_interval = interval;
        config
    }

    #[test]
    fn disabled_strategy_never_triggers() {
        let config = LoopConfig::default();
        assert!(!plan_due(&config, 100, None, 3));
    }

    #[test]
    fn interval_is_floored_at_five_steps() {
        let config = config_with_strategy(1);
        assert!(!plan_due(&config, 4, Some(0), 0));
        assert!(plan_due(&config, 5, Some(0), 0));
    }

    #[test]
    fn severe_stall_triggers_replan_regardless_of_interval() {
        let config = config_with_strategy(20);
        assert!(plan_due(&config, 2, Some(0), 2));
    }

    #[test]
    fn restrategize_on_stall_can_be_disabled() {
        let mut config = config_with_strategy(20);
        config.restrategize_on_stall = false;
        assert!(!plan_due(&config, 2, Some(0), 3));
    }
}
