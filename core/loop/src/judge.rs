//! The optional simple judge (§4.1 step 11): a single extra model call that
//! can reject a premature `finish` and send the run back around for another
//! step instead of ending it.

use serde_json::Value;
use serde_json::json;

/// The fixed `{approve, reason}` schema the judge call requests.
pub fn judge_schema() -> Value {
    json!({
        "type": "object",
        "required": ["approve", "reason"],
        "properties": {
            "approve": {"type": "boolean"},
            "reason": {"type": "string"}
        }
    })
}

/// The verdict of one judge call.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub approve: bool,
    pub reason: String,
}

/// Parse a judge response, defaulting to disapproval with an empty reason
/// when the response is malformed rather than erroring the step.
pub fn parse_verdict(parsed: &Value) -> Verdict {
    Verdict {
        approve: parsed.get("approve").and_then(Value::as_bool).unwrap_or(false),
        reason: parsed.get("reason").and_then(Value::as_str).unwrap_or_default().to_string(),
    }
}

/// The prompt text sent alongside the conversation for a judge call.
pub fn judge_prompt(task: &str, finish_text: &str) -> String {
    format!(
        "The agent believes the task is complete and is reporting: \"{finish_text}\".\n\
         The original task was: \"{task}\".\n\
         Review the conversation above and decide whether this genuinely satisfies the task. \
         Respond with `approve: false` and a reason if more work is needed."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_verdict_defaults_to_disapproval() {
        let verdict = parse_verdict(&json!({}));
        assert!(!verdict.approve);
        assert_eq!(verdict.reason, "");
    }

    #[test]
    fn approved_verdict_carries_its_reason() {
        let verdict = parse_verdict(&json!({"approve": true, "reason": "looks complete"}));
        assert!(verdict.approve);
        assert_eq!(verdict.reason, "looks complete");
    }
}
