//! Layered run configuration: step/deadline limits, the context window and
//! compaction policy, stall-detector thresholds, sandbox resource caps, and
//! the cost budget (§10.3).

use serde::Deserialize;
use serde::Serialize;

/// Step Loop timing and retry knobs (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub step_limit: i64,
    pub step_deadline_ms: i64,
    pub model_deadline_ms: i64,
    pub commands_per_step: i64,
    pub failure_threshold: i64,
    pub retry_delay_secs: u64,
    pub enable_strategy: bool,
    pub strategy_interval: i64,
    pub restrategize_on_stall: bool,
    pub auto_navigate_to_urls: bool,
    /// Model ids that should receive the compact `{currentState: {evaluation,
    /// nextGoal}, actions}` response schema rather than the standard one
    /// (§4.1 step 6).
    pub compact_models: Vec<String>,
    /// Force the compact schema regardless of model id.
    pub compact_mode: bool,
    /// Model ids that should receive the reasoning-free direct schema
    /// (§4.1 step 6).
    pub deep_reasoning_models: Vec<String>,
    /// Force the reasoning-free direct schema regardless of model id.
    pub deep_reasoning: bool,
    /// Commands run in order before step 1, individual failures ignored
    /// (§4.1 "Preflight"). Each entry is a JSON-encoded `Command`.
    pub preflight_commands: Vec<String>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            step_limit: 50,
            step_deadline_ms: 0,
            model_deadline_ms: 0,
            commands_per_step: 10,
            failure_threshold: 5,
            retry_delay_secs: 2,
            enable_strategy: false,
            strategy_interval: 5,
            restrategize_on_stall: true,
            auto_navigate_to_urls: true,
            compact_models: Vec::new(),
            compact_mode: false,
            deep_reasoning_models: Vec::new(),
            deep_reasoning: false,
            preflight_commands: Vec::new(),
        }
    }
}

/// Conversation Manager context window and compaction policy (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionConfig {
    pub context_window_tokens: i64,
    pub llm_compaction_interval: i64,
    pub llm_compaction_target_fraction: f64,
    pub llm_compaction_model: Option<String>,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            context_window_tokens: 128_000,
            llm_compaction_interval: 0,
            llm_compaction_target_fraction: 0.6,
            llm_compaction_model: None,
        }
    }
}

/// Stall Detector tuning (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StallConfig {
    pub window_size: usize,
    pub max_repeated_actions: usize,
    pub max_repeated_fingerprints: usize,
    pub max_stagnant_pages: usize,
}

impl Default for StallConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            max_repeated_actions: 3,
            max_repeated_fingerprints: 3,
            max_stagnant_pages: 5,
        }
    }
}

/// Sandbox Supervisor resource caps and browser domain policy (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxCapsConfig {
    pub timeout_ms: u64,
    pub max_memory_mb: u64,
    pub resource_check_interval_ms: u64,
    pub allowed_domains: Vec<String>,
    pub blocked_domains: Vec<String>,
    pub enable_networking: bool,
    pub enable_file_access: bool,
    pub capture_output: bool,
}

impl Default for SandboxCapsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 300_000,
            max_memory_mb: 1024,
            resource_check_interval_ms: 1000,
            allowed_domains: Vec::new(),
            blocked_domains: Vec::new(),
            enable_networking: true,
            enable_file_access: false,
            capture_output: true,
        }
    }
}

/// USD cost budget thresholds (§3 Budget).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetPolicyConfig {
    pub max_cost_usd: f64,
    pub thresholds: Vec<f64>,
}

impl Default for BudgetPolicyConfig {
    fn default() -> Self {
        Self {
            max_cost_usd: 0.0,
            thresholds: vec![0.5, 0.8, 1.0],
        }
    }
}

/// The full layered configuration for one agent run, assembled by
/// [`crate::loader::ConfigLoader::load_all`] from defaults, `config.toml`,
/// and environment overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub model_id: Option<String>,
    #[serde(rename = "loop")]
    pub loop_config: LoopConfig,
    pub compaction: CompactionConfig,
    pub stall: StallConfig,
    pub sandbox: SandboxCapsConfig,
    pub budget: BudgetPolicyConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = RunConfig::default();
        let serialised = toml::to_string(&config).expect("serialize");
        let parsed: RunConfig = toml::from_str(&serialised).expect("deserialize");
        assert_eq!(parsed.loop_config.step_limit, config.loop_config.step_limit);
        assert_eq!(parsed.stall.window_size, config.stall.window_size);
    }

    #[test]
    fn partial_toml_fills_remaining_fields_with_defaults() {
        let toml_text = "model_id = \"gpt-4o\"\n\n[loop]\nstep_limit = 25\n";
        let parsed: RunConfig = toml::from_str(toml_text).expect("deserialize");
        assert_eq!(parsed.model_id.as_deref(), Some("gpt-4o"));
        assert_eq!(parsed.loop_config.step_limit, 25);
        assert_eq!(parsed.loop_config.commands_per_step, 10, "unset fields keep their default");
    }
}
