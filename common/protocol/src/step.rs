//! Per-step accounting: token/cost usage and the step log entry (§3, §4.1).

use serde::Deserialize;
use serde::Serialize;

use crate::command::Command;
use crate::command::CommandResult;
use crate::page::PageSignature;

/// Token and cost accounting for a single model invocation (§4.1 step 8).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cached_input_tokens: i64,
    pub cost_usd: f64,
}

impl Usage {
    pub fn total_tokens(&self) -> i64 {
        self.input_tokens + self.output_tokens
    }

    pub fn accumulate(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cached_input_tokens += other.cached_input_tokens;
        self.cost_usd += other.cost_usd;
    }
}

/// One executed command within a [`StepRecord`], paired with its result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub command: Command,
    pub result: CommandResult,
}

/// A single completed step of the Step Loop, as appended to the run log.
///
/// `page_signature` carries the page surface observed at step start; a
/// screenshot, if one was taken, is held by the sandbox's captured output
/// rather than duplicated here, and is omitted entirely when the record is
/// serialised for persistence (§6 Process surface).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub page_signature: Option<PageSignature>,
    pub commands: Vec<CommandOutcome>,
    pub usage: Usage,
    pub duration_ms: i64,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl StepRecord {
    /// Whether any command in this step reported `is_done`.
    pub fn is_done(&self) -> bool {
        self.commands.iter().any(|c| c.result.is_done)
    }

    /// Whether every command in this step succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.commands.iter().all(|c| c.result.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::page::PageSignature;

    fn outcome(result: CommandResult) -> CommandOutcome {
        CommandOutcome {
            command: Command::Back,
            result,
        }
    }

    fn record(commands: Vec<CommandOutcome>) -> StepRecord {
        StepRecord {
            step: 1,
            timestamp: chrono::DateTime::UNIX_EPOCH,
            page_signature: Some(PageSignature::new("https://example.com", "h1", 0)),
            commands,
            usage: Usage::default(),
            duration_ms: 10,
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn usage_accumulates_across_steps() {
        let mut total = Usage::default();
        total.accumulate(&Usage {
            input_tokens: 100,
            output_tokens: 20,
            cached_input_tokens: 0,
            cost_usd: 0.01,
        });
        total.accumulate(&Usage {
            input_tokens: 50,
            output_tokens: 10,
            cached_input_tokens: 5,
            cost_usd: 0.005,
        });
        assert_eq!(total.total_tokens(), 180);
        assert_eq!(total.cached_input_tokens, 5);
        assert!((total.cost_usd - 0.015).abs() < f64::EPSILON);
    }

    #[test]
    fn is_done_true_when_any_command_is_done() {
        let record = record(vec![
            outcome(CommandResult::ok()),
            outcome(CommandResult::done("finished", true)),
        ]);
        assert!(record.is_done());
    }

    #[test]
    fn all_succeeded_false_on_any_failure() {
        let record = record(vec![outcome(CommandResult::ok()), outcome(CommandResult::failed("boom"))]);
        assert!(!record.all_succeeded());
    }
}
