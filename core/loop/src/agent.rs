//! The Step Loop (§4.1): the per-step algorithm that drives one run from a
//! task string to a [`RunOutcome`].

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use helm_commands::catalog::CommandCatalog;
use helm_commands::collaborators::BrowserCollaborator;
use helm_commands::collaborators::FileAccess;
use helm_commands::collaborators::PageAnalyzer;
use helm_commands::context::ExecutionContext;
use helm_commands::sequence::execute_sequence;
use helm_config::LoopConfig;
use helm_context::Budget;
use helm_message::ConversationManager;
use helm_message::MaskedValue;
use helm_model::ApiError;
use helm_model::ModelCollaborator;
use helm_model::ModelRequest;
use helm_model::PricingTable;
use helm_protocol::AgentState;
use helm_protocol::Command;
use helm_protocol::CommandOutcome;
use helm_protocol::CommandResult;
use helm_protocol::PageSignature;
use helm_protocol::Role;
use helm_protocol::StepRecord;
use helm_protocol::Usage;
use helm_stall::StallDetector;
use helm_stall::join_step_fingerprint;
use helm_stall::normalize_action;
use serde_json::Value;
use serde_json::json;

use crate::error::AgentError;
use crate::error::agent_error;
use crate::judge::judge_prompt;
use crate::judge::judge_schema;
use crate::judge::parse_verdict;
use crate::planner::extract_plan;
use crate::planner::plan_due;
use crate::planner::plan_schema;
use crate::preflight::extract_first_url;
use crate::preflight::parse_preflight_commands;
use crate::result::RunOutcome;
use crate::schema::Decision;
use crate::schema::SchemaKind;
use crate::schema::normalize_decision;
use crate::schema::response_schema;
use crate::schema::schema_name;
use crate::schema::select_schema;

const SCHEMA_RETRIES: u32 = 2;

type StepEndCallback = Box<dyn FnMut(&StepRecord) + Send>;
type StepStartCallback = Box<dyn FnMut(i64) + Send>;
type DoneCallback = Box<dyn FnMut(&RunOutcome) + Send>;

/// A cooperative handle to pause, resume, or stop a run in progress from
/// outside the task driving [`Agent::run`].
#[derive(Clone)]
pub struct AgentHandle {
    stop: Arc<AtomicBool>,
    pause: Arc<AtomicBool>,
}

impl AgentHandle {
    pub fn pause(&self) {
        self.pause.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.pause.store(false, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Builds an [`Agent`] from its required collaborators plus optional
/// policy/config overrides.
pub struct AgentBuilder {
    browser: Arc<dyn BrowserCollaborator>,
    dom_service: Arc<dyn PageAnalyzer>,
    model: Arc<dyn ModelCollaborator>,
    catalog: Arc<CommandCatalog>,
    config: LoopConfig,
    pricing: PricingTable,
    budget: Option<Budget>,
    extraction_llm: Option<Arc<dyn ModelCollaborator>>,
    file_system: Option<Arc<dyn FileAccess>>,
    masked_values: Vec<MaskedValue>,
    allowed_domains: Vec<String>,
    blocked_domains: Vec<String>,
    enable_simple_judge: bool,
    context_window_tokens: i64,
}

impl AgentBuilder {
    pub fn new(
        browser: Arc<dyn BrowserCollaborator>,
        dom_service: Arc<dyn PageAnalyzer>,
        model: Arc<dyn ModelCollaborator>,
        catalog: Arc<CommandCatalog>,
    ) -> Self {
        Self {
            browser,
            dom_service,
            model,
            catalog,
            config: LoopConfig::default(),
            pricing: PricingTable::default(),
            budget: None,
            extraction_llm: None,
            file_system: None,
            masked_values: Vec::new(),
            allowed_domains: Vec::new(),
            blocked_domains: Vec::new(),
            enable_simple_judge: false,
            context_window_tokens: 128_000,
        }
    }

    pub fn with_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_context_window_tokens(mut self, tokens: i64) -> Self {
        self.context_window_tokens = tokens;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_extraction_llm(mut self, model: Arc<dyn ModelCollaborator>) -> Self {
        self.extraction_llm = Some(model);
        self
    }

    pub fn with_file_system(mut self, file_system: Arc<dyn FileAccess>) -> Self {
        self.file_system = Some(file_system);
        self
    }

    pub fn with_masked_values(mut self, masked_values: Vec<MaskedValue>) -> Self {
        self.masked_values = masked_values;
        self
    }

    pub fn with_url_policy(mut self, allowed: Vec<String>, blocked: Vec<String>) -> Self {
        self.allowed_domains = allowed;
        self.blocked_domains = blocked;
        self
    }

    /// Enable the optional extra judge call that can reject a premature
    /// `finish` (§4.1 step 11).
    pub fn with_simple_judge(mut self, enabled: bool) -> Self {
        self.enable_simple_judge = enabled;
        self
    }

    pub fn build(self) -> Agent {
        let compaction = helm_config::CompactionConfig {
            context_window_tokens: self.context_window_tokens,
            ..helm_config::CompactionConfig::default()
        };
        Agent {
            browser: self.browser,
            dom_service: self.dom_service,
            model: self.model,
            catalog: self.catalog,
            conversation: ConversationManager::new(compaction),
            stall: StallDetector::new(helm_config::StallConfig::default()),
            pricing: self.pricing,
            budget: self.budget,
            state: AgentState::new(self.config.step_limit),
            config: self.config,
            history: Vec::new(),
            errors: Vec::new(),
            extraction_llm: self.extraction_llm,
            file_system: self.file_system,
            masked_values: self.masked_values,
            allowed_domains: self.allowed_domains,
            blocked_domains: self.blocked_domains,
            enable_simple_judge: self.enable_simple_judge,
            throttle_streak: 0,
            stop: Arc::new(AtomicBool::new(false)),
            pause: Arc::new(AtomicBool::new(false)),
            on_step_start: None,
            on_step_end: None,
            on_done: None,
        }
    }
}

/// The Step Loop driver: owns the run's conversation, stall detector, and
/// cost accounting, and executes one task to completion, a terminal error,
/// or the step limit (§4.1).
pub struct Agent {
    browser: Arc<dyn BrowserCollaborator>,
    dom_service: Arc<dyn PageAnalyzer>,
    model: Arc<dyn ModelCollaborator>,
    catalog: Arc<CommandCatalog>,
    conversation: ConversationManager,
    stall: StallDetector,
    pricing: PricingTable,
    budget: Option<Budget>,
    config: LoopConfig,
    state: AgentState,
    history: Vec<StepRecord>,
    errors: Vec<String>,
    extraction_llm: Option<Arc<dyn ModelCollaborator>>,
    file_system: Option<Arc<dyn FileAccess>>,
    masked_values: Vec<MaskedValue>,
    allowed_domains: Vec<String>,
    blocked_domains: Vec<String>,
    enable_simple_judge: bool,
    /// Consecutive throttle responses, tracked separately from
    /// `state.consecutive_failures` since throttling never counts toward
    /// the failure threshold (§7 error kind 1), only toward its own backoff.
    throttle_streak: u32,
    stop: Arc<AtomicBool>,
    pause: Arc<AtomicBool>,
    on_step_start: Option<StepStartCallback>,
    on_step_end: Option<StepEndCallback>,
    on_done: Option<DoneCallback>,
}

/// What one step produced, once it runs to completion without erroring.
enum StepOutcome {
    Continue,
    Done(Value),
}

/// How a step failed, distinguishing throttling (never fatal, doesn't count
/// toward the failure threshold), a severity-3 stall (fatal for the run,
/// §7 error kind 4), and any other recoverable error.
enum StepProblem {
    Throttled(Duration),
    Stalled(String),
    Recoverable(String),
}

impl Agent {
    pub fn handle(&self) -> AgentHandle {
        AgentHandle {
            stop: self.stop.clone(),
            pause: self.pause.clone(),
        }
    }

    pub fn on_step_start(&mut self, callback: impl FnMut(i64) + Send + 'static) {
        self.on_step_start = Some(Box::new(callback));
    }

    pub fn on_step_end(&mut self, callback: impl FnMut(&StepRecord) + Send + 'static) {
        self.on_step_end = Some(Box::new(callback));
    }

    pub fn on_done(&mut self, callback: impl FnMut(&RunOutcome) + Send + 'static) {
        self.on_done = Some(Box::new(callback));
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    /// Run `task` to completion (§4.1).
    pub async fn run(&mut self, task: &str) -> RunOutcome {
        self.preflight(task).await;
        self.conversation
            .set_instruction_builder(build_instruction(task, &self.catalog.names()));

        let mut final_result = None;

        loop {
            while self.pause.load(Ordering::SeqCst) && !self.stop.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            if self.stop.load(Ordering::SeqCst) {
                self.errors.push("run stopped by caller".to_string());
                break;
            }
            if self.state.step_limit_reached() {
                self.errors.push(
                    agent_error::StepLimitExceededSnafu {
                        step_limit: self.state.step_limit,
                    }
                    .build()
                    .to_string(),
                );
                break;
            }

            self.state.step += 1;
            self.conversation.set_current_step(self.state.step);
            if let Some(cb) = &mut self.on_step_start {
                cb(self.state.step);
            }

            let outcome = if self.config.step_deadline_ms > 0 {
                match tokio::time::timeout(Duration::from_millis(self.config.step_deadline_ms as u64), self.run_one_step(task)).await {
                    Ok(result) => result,
                    Err(_) => Err(StepProblem::Recoverable("step deadline exceeded".to_string())),
                }
            } else {
                self.run_one_step(task).await
            };

            match outcome {
                Ok(StepOutcome::Continue) => {
                    self.throttle_streak = 0;
                    self.state.record_success();
                }
                Ok(StepOutcome::Done(result)) => {
                    self.throttle_streak = 0;
                    self.state.record_success();
                    self.state.is_done = true;
                    final_result = Some(result);
                    if let Some(record) = self.history.last() {
                        if let Some(cb) = &mut self.on_step_end {
                            cb(record);
                        }
                    }
                    break;
                }
                Err(StepProblem::Throttled(delay)) => {
                    self.throttle_streak += 1;
                    tracing::warn!(delay_ms = delay.as_millis() as u64, "model throttled, backing off");
                    tokio::time::sleep(delay).await;
                    self.state.step -= 1;
                    continue;
                }
                Err(StepProblem::Stalled(message)) => {
                    self.throttle_streak = 0;
                    self.errors.push(format!("Step {}: {message}", self.state.step));
                    if let Some(record) = self.history.last() {
                        if let Some(cb) = &mut self.on_step_end {
                            cb(record);
                        }
                    }
                    break;
                }
                Err(StepProblem::Recoverable(message)) => {
                    self.throttle_streak = 0;
                    self.errors.push(format!("Step {}: {message}", self.state.step));
                    self.state.record_failure();
                    self.conversation.add_user_message(format!("Error: {}", truncate(&message, 500)));
                    tokio::time::sleep(Duration::from_secs(self.config.retry_delay_secs)).await;
                }
            }

            if let Some(record) = self.history.last() {
                if let Some(cb) = &mut self.on_step_end {
                    cb(record);
                }
            }

            if self.state.consecutive_failures >= self.config.failure_threshold {
                let diagnosis = self.diagnose_failure(task).await;
                self.errors.push(
                    agent_error::FailureThresholdExceededSnafu {
                        consecutive_failures: self.state.consecutive_failures,
                        message: diagnosis.clone(),
                    }
                    .build()
                    .to_string(),
                );
                break;
            }
        }

        let outcome = RunOutcome {
            final_result,
            success: self.state.is_done && self.errors.is_empty(),
            history: self.history.clone(),
            errors: self.errors.clone(),
            total_cost: self.state.cumulative_cost_usd,
            judgement: None,
            simple_judgement: None,
        };
        if let Some(cb) = &mut self.on_done {
            cb(&outcome);
        }
        outcome
    }

    /// Auto-navigate to the first URL mentioned in the task, then run any
    /// configured preflight commands, ignoring individual failures (§4.1
    /// "Preflight").
    async fn preflight(&mut self, task: &str) {
        if self.config.auto_navigate_to_urls {
            if let Some(url) = extract_first_url(task) {
                if let Err(error) = self.browser.navigate(&url).await {
                    tracing::warn!(%error, url = %url, "preflight auto-navigate failed");
                }
            }
        }

        for command in parse_preflight_commands(&self.config.preflight_commands) {
            let ctx = self.execution_context();
            if let Err(error) = self.catalog.dispatch(&command, &ctx).await {
                tracing::warn!(%error, action = command.action_name(), "preflight command failed");
            }
        }
    }

    fn execution_context(&self) -> ExecutionContext {
        let mut ctx = ExecutionContext::new(self.browser.clone(), self.dom_service.clone())
            .with_masked_values(self.masked_values.clone())
            .with_url_policy(self.allowed_domains.clone(), self.blocked_domains.clone());
        if let Some(llm) = &self.extraction_llm {
            ctx = ctx.with_extraction_llm(llm.clone());
        }
        if let Some(fs) = &self.file_system {
            ctx = ctx.with_file_system(fs.clone());
        }
        ctx
    }

    async fn run_one_step(&mut self, task: &str) -> Result<StepOutcome, StepProblem> {
        let started_at = Instant::now();
        let step = self.state.step;

        let browser_state = self
            .browser
            .get_state()
            .await
            .map_err(|error| StepProblem::Recoverable(error.to_string()))?;
        let page = self.browser.current_page();
        let cdp = self.browser.cdp();
        let analysis = self
            .dom_service
            .extract_state(&page, &cdp)
            .await
            .map_err(|error| StepProblem::Recoverable(error.to_string()))?;
        let screenshot = self.browser.screenshot(false).await.ok();
        let page_sig = page_signature(&browser_state.url, &analysis);

        let stall_status = self.stall.is_stuck();
        if stall_status.severity >= 3 {
            let reason = stall_status.reason.clone().unwrap_or_else(|| "stalled".to_string());
            return Err(StepProblem::Stalled(
                agent_error::StalledSnafu { reason }.build().to_string(),
            ));
        }
        let nudge = stall_status
            .stuck
            .then(|| self.stall.loop_nudge_message(stall_status.reason.as_deref().unwrap_or("stalled")));

        let state_text = build_state_text(&browser_state, &analysis, self.state.current_plan.as_deref(), nudge.as_deref());
        let screenshot_parts = screenshot.map(|shot| (shot.base64, "image/png".to_string()));
        self.conversation.add_state_message(state_text, screenshot_parts, Some(step));

        let kind = select_schema(&self.config, self.model.model_id());
        let response = self.invoke_with_recovery(kind).await.map_err(|error| match error {
            ApiError::Throttled { retry_after_ms, .. } => {
                let delay = retry_after_ms
                    .map(|ms| Duration::from_millis(ms as u64))
                    .unwrap_or_else(|| Duration::from_secs(2u64.saturating_pow(self.throttle_streak.min(5)).min(60)));
                StepProblem::Throttled(delay)
            }
            other => StepProblem::Recoverable(other.to_string()),
        })?;

        let cost = self.pricing.cost_usd(self.model.model_id(), response.input_tokens, response.output_tokens);
        self.state.record_usage(response.input_tokens, response.output_tokens, cost);
        if let Some(budget) = &mut self.budget {
            budget.record_cost(cost);
        }

        let decision = normalize_decision(&response.parsed, kind).map_err(|error| StepProblem::Recoverable(error.to_string()))?;
        self.conversation.add_assistant_message(
            serde_json::to_string(&decision_summary(&decision)).unwrap_or_default(),
            Some(step),
        );

        let ctx = self.execution_context();
        let results = execute_sequence(&self.catalog, &decision.actions, &ctx, self.config.commands_per_step.max(0) as usize).await;

        self.record_stall_history(&decision.actions, &results, page_sig.clone());
        self.append_result_messages(&decision.actions, &results, step);

        let usage = Usage {
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
            cached_input_tokens: 0,
            cost_usd: cost,
        };
        let duration_ms = started_at.elapsed().as_millis() as i64;
        let outcomes: Vec<CommandOutcome> = decision
            .actions
            .iter()
            .take(results.len())
            .cloned()
            .zip(results.iter().cloned())
            .map(|(command, result)| CommandOutcome { command, result })
            .collect();

        self.history.push(StepRecord {
            step,
            timestamp: chrono::Utc::now(),
            page_signature: Some(page_sig),
            commands: outcomes,
            usage,
            duration_ms,
            metadata: serde_json::Map::new(),
        });

        if let Some(done_result) = results.iter().find(|r| r.is_done) {
            return self.resolve_finish(task, done_result.clone(), step).await;
        }

        self.maybe_update_plan(task, stall_status.severity).await;
        self.conversation.compact_with_llm(Some(self.model.as_ref())).await;

        Ok(StepOutcome::Continue)
    }

    /// Decide whether a `finish` result actually ends the run, optionally
    /// deferring to the simple judge (§4.1 step 11).
    async fn resolve_finish(&mut self, task: &str, done_result: CommandResult, step: i64) -> Result<StepOutcome, StepProblem> {
        let finish_text = done_result.extracted_content.clone().unwrap_or_default();

        if self.enable_simple_judge && self.state.step < self.state.step_limit {
            self.conversation
                .add_ephemeral_message(judge_prompt(task, &finish_text), Role::User);
            let request = ModelRequest {
                messages: self.conversation.get_messages(),
                response_schema: judge_schema(),
                schema_name: "simple_judge".to_string(),
                schema_description: None,
                max_tokens: None,
                temperature: Some(0.0),
            };
            if let Ok(response) = self.model.invoke(request).await {
                let verdict = parse_verdict(&response.parsed);
                if !verdict.approve {
                    self.conversation
                        .add_command_result_message(format!("Judge rejected completion: {}", verdict.reason), Some(step));
                    return Ok(StepOutcome::Continue);
                }
            }
        }

        Ok(StepOutcome::Done(json!({
            "text": finish_text,
            "success": done_result.success,
        })))
    }

    /// Re-prompt on schema violations up to [`SCHEMA_RETRIES`] times,
    /// appending the offending fields each time; any other error (including
    /// throttling) bubbles straight up (§4.1 step 7, §7 error kind 2).
    async fn invoke_with_recovery(&mut self, kind: SchemaKind) -> Result<helm_model::ModelResponse, ApiError> {
        let mut attempt = 0;
        loop {
            let request = ModelRequest {
                messages: self.conversation.get_messages(),
                response_schema: response_schema(kind),
                schema_name: schema_name(kind).to_string(),
                schema_description: None,
                max_tokens: None,
                temperature: None,
            };

            let invocation = if self.config.model_deadline_ms > 0 {
                match tokio::time::timeout(Duration::from_millis(self.config.model_deadline_ms as u64), self.model.invoke(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(ApiError::timeout(self.config.model_deadline_ms)),
                }
            } else {
                self.model.invoke(request).await
            };

            match invocation {
                Ok(response) => return Ok(response),
                Err(ApiError::SchemaViolation { message, failing_fields, .. }) if attempt < SCHEMA_RETRIES => {
                    attempt += 1;
                    self.conversation.add_user_message(format!(
                        "Your previous response had schema issues with: {}. {message}. Please resend a valid response.",
                        failing_fields.join(", ")
                    ));
                }
                Err(other) => return Err(other),
            }
        }
    }

    async fn maybe_update_plan(&mut self, task: &str, stall_severity: u8) {
        if !plan_due(&self.config, self.state.step, self.state.last_plan_step, stall_severity) {
            return;
        }

        self.conversation
            .add_ephemeral_message(format!("Update the plan for: {task}"), Role::User);
        let request = ModelRequest {
            messages: self.conversation.get_messages(),
            response_schema: plan_schema(),
            schema_name: "plan_update".to_string(),
            schema_description: None,
            max_tokens: None,
            temperature: Some(0.3),
        };

        match self.model.invoke(request).await {
            Ok(response) => {
                if let Some(plan) = extract_plan(&response.parsed) {
                    self.state.update_plan(plan, self.state.step);
                }
            }
            Err(error) => tracing::warn!(%error, "plan update call failed"),
        }
    }

    /// A single diagnostic model call made once the failure threshold is
    /// crossed, best-effort only: its result becomes the failure message,
    /// never a retried action (§4.1 "Failure policy").
    async fn diagnose_failure(&mut self, task: &str) -> String {
        self.conversation.add_ephemeral_message(
            format!("The run for \"{task}\" has failed repeatedly. Briefly diagnose what went wrong."),
            Role::User,
        );
        let request = ModelRequest {
            messages: self.conversation.get_messages(),
            response_schema: json!({"type": "object", "required": ["diagnosis"], "properties": {"diagnosis": {"type": "string"}}}),
            schema_name: "failure_diagnosis".to_string(),
            schema_description: None,
            max_tokens: None,
            temperature: Some(0.0),
        };
        match self.model.invoke(request).await {
            Ok(response) => response
                .parsed
                .get("diagnosis")
                .and_then(Value::as_str)
                .unwrap_or("no diagnosis available")
                .to_string(),
            Err(error) => error.to_string(),
        }
    }

    fn record_stall_history(&mut self, actions: &[Command], results: &[CommandResult], page_sig: PageSignature) {
        let fingerprints: Vec<String> = actions.iter().take(results.len()).map(normalize_action).collect();
        self.stall.record_action(join_step_fingerprint(&fingerprints));
        self.stall.record_fingerprint(page_sig);
    }

    fn append_result_messages(&mut self, actions: &[Command], results: &[CommandResult], step: i64) {
        for (command, result) in actions.iter().zip(results.iter()) {
            let line = if result.success {
                format!("{}: {}", command.action_name(), result.extracted_content.as_deref().unwrap_or("ok"))
            } else {
                format!("{}: error: {}", command.action_name(), result.error.as_deref().unwrap_or("unknown error"))
            };
            self.conversation.add_command_result_message(line, Some(step));
        }
    }
}

fn decision_summary(decision: &Decision) -> Value {
    json!({
        "evaluation": decision.evaluation,
        "memory": decision.memory,
        "nextGoal": decision.next_goal,
    })
}

fn page_signature(url: &str, analysis: &helm_commands::collaborators::PageAnalysis) -> PageSignature {
    use std::hash::Hash;
    use std::hash::Hasher;

    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    analysis.tree.to_string().hash(&mut hasher);
    let dom_hash = format!("{:x}", hasher.finish());
    PageSignature::new(url, dom_hash, analysis.scroll_position.y).with_element_count(analysis.element_count)
}

fn build_state_text(
    browser_state: &helm_commands::collaborators::BrowserState,
    analysis: &helm_commands::collaborators::PageAnalysis,
    plan: Option<&str>,
    nudge: Option<&str>,
) -> String {
    let mut text = format!(
        "Current URL: {}\nTitle: {}\nOpen tabs: {}\nInteractive elements: {} ({} px above / {} px below the fold)\n\n{}",
        browser_state.url,
        browser_state.title,
        browser_state.tabs.join(", "),
        analysis.element_count,
        analysis.pixels_above,
        analysis.pixels_below,
        serde_json::to_string(&analysis.selector_map).unwrap_or_default(),
    );
    if let Some(plan) = plan {
        text.push_str(&format!("\n\nCurrent plan:\n{plan}"));
    }
    if let Some(nudge) = nudge {
        text.push_str(&format!("\n\n{nudge}"));
    }
    text
}

fn build_instruction(task: &str, actions: &[String]) -> String {
    format!(
        "You are a web automation agent driving a live browser session.\n\nTask:\n{task}\n\nAvailable actions: {}\n\nRespond only via the schema you were given.",
        actions.join(", ")
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
