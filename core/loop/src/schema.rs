//! Response schema selection and decision normalisation (§4.1 step 6).
//!
//! The model is asked for one of three response shapes depending on the
//! model id in play: the full `{currentState: {evaluation, memory,
//! nextGoal}, actions}` shape, a compact shape that drops `memory` and
//! folds `evaluation`/`nextGoal` into a single `goal`, or a reasoning-free
//! "direct" shape that carries only `evaluation`. Whichever shape comes
//! back, the loop normalises it to the same [`Decision`] before acting.

use helm_config::LoopConfig;
use helm_protocol::Command;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

/// Which response schema a model call should request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Standard,
    Compact,
    Direct,
}

/// Pick the schema kind for `model_id`, honouring the config's forced modes
/// before falling back to the per-model allow-lists.
pub fn select_schema(config: &LoopConfig, model_id: &str) -> SchemaKind {
    if config.compact_mode || config.compact_models.iter().any(|m| model_id.starts_with(m.as_str())) {
        return SchemaKind::Compact;
    }
    if config.deep_reasoning || config.deep_reasoning_models.iter().any(|m| model_id.starts_with(m.as_str())) {
        return SchemaKind::Direct;
    }
    SchemaKind::Standard
}

pub fn schema_name(kind: SchemaKind) -> &'static str {
    match kind {
        SchemaKind::Standard => "step_decision",
        SchemaKind::Compact => "step_decision_compact",
        SchemaKind::Direct => "step_decision_direct",
    }
}

/// The JSON schema requested for `kind` (§4.1 step 6).
pub fn response_schema(kind: SchemaKind) -> Value {
    let actions = json!({"type": "array", "items": {"type": "object"}});
    match kind {
        SchemaKind::Standard => json!({
            "type": "object",
            "required": ["currentState", "actions"],
            "properties": {
                "currentState": {
                    "type": "object",
                    "required": ["evaluation", "memory", "nextGoal"],
                    "properties": {
                        "evaluation": {"type": "string"},
                        "memory": {"type": "string"},
                        "nextGoal": {"type": "string"}
                    }
                },
                "actions": actions
            }
        }),
        SchemaKind::Compact => json!({
            "type": "object",
            "required": ["goal", "actions"],
            "properties": {
                "goal": {"type": "string"},
                "actions": actions
            }
        }),
        SchemaKind::Direct => json!({
            "type": "object",
            "required": ["currentState", "actions"],
            "properties": {
                "currentState": {
                    "type": "object",
                    "required": ["evaluation"],
                    "properties": {
                        "evaluation": {"type": "string"}
                    }
                },
                "actions": actions
            }
        }),
    }
}

/// The normalised shape every schema variant collapses to before the Step
/// Loop appends it as an assistant message and executes its actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub evaluation: String,
    pub memory: String,
    pub next_goal: String,
    pub actions: Vec<Command>,
}

/// Parse and normalise a model response parsed as `kind` into a [`Decision`]
/// and its commands; missing `memory`/`nextGoal` fields in the compact and
/// direct shapes default to empty strings (§4.1 step 9).
pub fn normalize_decision(parsed: &Value, kind: SchemaKind) -> Result<Decision, serde_json::Error> {
    let actions: Vec<Command> = serde_json::from_value(parsed.get("actions").cloned().unwrap_or(Value::Array(vec![])))?;

    let (evaluation, memory, next_goal) = match kind {
        SchemaKind::Compact => {
            let goal = parsed.get("goal").and_then(Value::as_str).unwrap_or_default().to_string();
            (goal.clone(), String::new(), goal)
        }
        SchemaKind::Direct => {
            let evaluation = parsed
                .get("currentState")
                .and_then(|s| s.get("evaluation"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            (evaluation, String::new(), String::new())
        }
        SchemaKind::Standard => {
            let state = parsed.get("currentState").cloned().unwrap_or(Value::Null);
            let field = |name: &str| state.get(name).and_then(Value::as_str).unwrap_or_default().to_string();
            (field("evaluation"), field("memory"), field("nextGoal"))
        }
    };

    Ok(Decision {
        evaluation,
        memory,
        next_goal,
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_mode_forces_compact_schema_regardless_of_model() {
        let mut config = LoopConfig::default();
        config.compact_mode = true;
        assert_eq!(select_schema(&config, "gpt-5"), SchemaKind::Compact);
    }

    #[test]
    fn model_allow_list_selects_compact_schema() {
        let mut config = LoopConfig::default();
        config.compact_models = vec!["gemini-flash".to_string()];
        assert_eq!(select_schema(&config, "gemini-flash-lite"), SchemaKind::Compact);
        assert_eq!(select_schema(&config, "gpt-5"), SchemaKind::Standard);
    }

    #[test]
    fn compact_response_promotes_goal_to_evaluation_and_next_goal() {
        let parsed = json!({"goal": "open settings", "actions": []});
        let decision = normalize_decision(&parsed, SchemaKind::Compact).expect("normalise");
        assert_eq!(decision.evaluation, "open settings");
        assert_eq!(decision.next_goal, "open settings");
        assert_eq!(decision.memory, "");
    }

    #[test]
    fn direct_response_fills_missing_fields_with_empty_strings() {
        let parsed = json!({"currentState": {"evaluation": "looks fine"}, "actions": []});
        let decision = normalize_decision(&parsed, SchemaKind::Direct).expect("normalise");
        assert_eq!(decision.evaluation, "looks fine");
        assert_eq!(decision.memory, "");
        assert_eq!(decision.next_goal, "");
    }

    #[test]
    fn standard_response_passes_through_all_three_fields() {
        let parsed = json!({
            "currentState": {"evaluation": "e", "memory": "m", "nextGoal": "g"},
            "actions": [{"action": "back"}]
        });
        let decision = normalize_decision(&parsed, SchemaKind::Standard).expect("normalise");
        assert_eq!(decision.evaluation, "e");
        assert_eq!(decision.memory, "m");
        assert_eq!(decision.next_goal, "g");
        assert_eq!(decision.actions.len(), 1);
    }
}
