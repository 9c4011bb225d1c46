//! The Sandbox Supervisor (§4.5): owns one sandboxed agent run end to end -
//! constructing the browser collaborator, racing the run against a timeout
//! and an OOM signal, capturing output, and always returning a
//! [`SandboxResult`], never propagating a Rust error out of [`SandboxSupervisor::run`].

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use helm_commands::catalog::CommandCatalog;
use helm_commands::collaborators::BrowserCollaborator;
use helm_commands::collaborators::FileAccess;
use helm_commands::collaborators::PageAnalyzer;
use helm_loop::AgentBuilder;
use helm_loop::LoopConfig;
use helm_message::MaskedValue;
use helm_model::ModelCollaborator;
use helm_model::PricingTable;
use helm_protocol::sandbox::SandboxConfig;
use helm_protocol::sandbox::SandboxError;
use helm_protocol::sandbox::SandboxErrorCategory;
use helm_protocol::sandbox::SandboxMetrics;
use helm_protocol::sandbox::SandboxResult;

use crate::error::SupervisorError;
use crate::monitor::ResourceMonitor;
use crate::outcome;
use crate::output::OutputCapture;

/// Constructs the browser collaborator pair a sandboxed run drives.
///
/// The browser driver and DOM renderer are out of scope for this
/// workspace (§1); a real embedding application supplies this factory.
#[async_trait]
pub trait BrowserFactory: Send + Sync {
    async fn create(
        &self,
        config: &SandboxConfig,
    ) -> Result<(Arc<dyn BrowserCollaborator>, Arc<dyn PageAnalyzer>), SupervisorError>;
}

enum RaceOutcome {
    Completed(helm_loop::RunOutcome),
    TimedOut,
    Oom,
}

/// Builds a [`SandboxSupervisor`].
pub struct SandboxSupervisorBuilder {
    config: SandboxConfig,
    browser_factory: Arc<dyn BrowserFactory>,
    model: Arc<dyn ModelCollaborator>,
    catalog: Arc<CommandCatalog>,
    loop_config: LoopConfig,
    pricing: PricingTable,
    extraction_llm: Option<Arc<dyn ModelCollaborator>>,
    file_system: Option<Arc<dyn FileAccess>>,
    masked_values: Vec<MaskedValue>,
    enable_simple_judge: bool,
}

impl SandboxSupervisorBuilder {
    pub fn new(
        config: SandboxConfig,
        browser_factory: Arc<dyn BrowserFactory>,
        model: Arc<dyn ModelCollaborator>,
        catalog: Arc<CommandCatalog>,
    ) -> Self {
        Self {
            config,
            browser_factory,
            model,
            catalog,
            loop_config: LoopConfig::default(),
            pricing: PricingTable::default(),
            extraction_llm: None,
            file_system: None,
            masked_values: Vec::new(),
            enable_simple_judge: false,
        }
    }

    pub fn with_loop_config(mut self, loop_config: LoopConfig) -> Self {
        self.loop_config = loop_config;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
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

    pub fn with_simple_judge(mut self, enabled: bool) -> Self {
        self.enable_simple_judge = enabled;
        self
    }

    pub fn build(self) -> SandboxSupervisor {
        SandboxSupervisor {
            config: self.config,
            browser_factory: self.browser_factory,
            model: self.model,
            catalog: self.catalog,
            loop_config: self.loop_config,
            pricing: self.pricing,
            extraction_llm: self.extraction_llm,
            file_system: self.file_system,
            masked_values: self.masked_values,
            enable_simple_judge: self.enable_simple_judge,
        }
    }
}

/// Drives one sandboxed agent run (§4.5 step-by-step lifecycle).
pub struct SandboxSupervisor {
    config: SandboxConfig,
    browser_factory: Arc<dyn BrowserFactory>,
    model: Arc<dyn ModelCollaborator>,
    catalog: Arc<CommandCatalog>,
    loop_config: LoopConfig,
    pricing: PricingTable,
    extraction_llm: Option<Arc<dyn ModelCollaborator>>,
    file_system: Option<Arc<dyn FileAccess>>,
    masked_values: Vec<MaskedValue>,
    enable_simple_judge: bool,
}

impl SandboxSupervisor {
    /// Run `task` under this supervisor's resource caps, always returning a
    /// [`SandboxResult`] rather than surfacing a Rust-level error (§4.5).
    pub async fn run(&self, task: &str) -> SandboxResult {
        let start = Instant::now();
        let check_interval = Duration::from_millis(self.config.resource_check_interval_ms.max(100));
        let monitor = ResourceMonitor::spawn(self.config.max_memory_mb, check_interval);
        let output_capture = self.config.capture_output.then(OutputCapture::new);

        let (browser, dom_service) = match self.browser_factory.create(&self.config).await {
            Ok(pair) => pair,
            Err(error) => {
                monitor.stop();
                return SandboxResult::failure(
                    SandboxError {
                        category: SandboxErrorCategory::BrowserError,
                        message: error.to_string(),
                        stack: None,
                    },
                    finished_metrics(SandboxMetrics::default(), start),
                );
            }
        };

        if let Err(error) = browser.start().await {
            monitor.stop();
            return SandboxResult::failure(outcome::agent_error(error.to_string()), finished_metrics(SandboxMetrics::default(), start));
        }

        let run_metrics = Arc::new(Mutex::new(SandboxMetrics::default()));
        let mut agent = self.build_agent(browser.clone(), dom_service);
        let cb_metrics = run_metrics.clone();
        agent.on_step_end(move |record| {
            if let Ok(mut metrics) = cb_metrics.lock() {
                metrics.steps_executed += 1;
                metrics.total_actions += record.commands.len() as i64;
                if let Some(signature) = &record.page_signature {
                    metrics.record_visit(signature.url.clone());
                }
            }
        });

        let timeout_ms = self.config.timeout_ms;
        let race = async {
            tokio::select! {
                run_outcome = agent.run(task) => RaceOutcome::Completed(run_outcome),
                _ = tokio::time::sleep(Duration::from_millis(timeout_ms)) => RaceOutcome::TimedOut,
                _ = watch_oom(&monitor) => RaceOutcome::Oom,
            }
        };
        let race_outcome = match &output_capture {
            Some(capture) => capture.scope(race).await,
            None => race.await,
        };

        let _ = tokio::time::timeout(Duration::from_secs(5), browser.close()).await;

        let mut metrics = run_metrics.lock().map(|guard| guard.clone()).unwrap_or_default();
        let monitor_metrics = monitor.metrics_snapshot();
        monitor.stop();
        metrics.peak_memory_mb = monitor_metrics.peak_memory_mb;
        metrics.cpu_time_ms = monitor_metrics.cpu_time_ms;
        metrics.duration_ms = start.elapsed().as_millis() as i64;

        let mut result = match race_outcome {
            RaceOutcome::Completed(run_outcome) if run_outcome.success => {
                SandboxResult::success(run_outcome.final_result.unwrap_or(serde_json::Value::Null), metrics)
            }
            RaceOutcome::Completed(run_outcome) => {
                SandboxResult::failure(outcome::agent_error(run_outcome.errors.join("; ")), metrics)
            }
            RaceOutcome::TimedOut => SandboxResult::failure(outcome::timeout_error(self.config.timeout_ms), metrics),
            RaceOutcome::Oom => SandboxResult::failure(outcome::oom_error(self.config.max_memory_mb), metrics),
        };
        result.captured_output = output_capture.map(OutputCapture::finish);
        result
    }

    fn build_agent(&self, browser: Arc<dyn BrowserCollaborator>, dom_service: Arc<dyn PageAnalyzer>) -> helm_loop::Agent {
        let mut loop_config = self.loop_config.clone();
        if self.config.step_limit > 0 {
            loop_config.step_limit = self.config.step_limit;
        }

        let mut builder = AgentBuilder::new(browser, dom_service, self.model.clone(), self.catalog.clone())
            .with_config(loop_config)
            .with_pricing(self.pricing.clone())
            .with_masked_values(self.masked_values.clone())
            .with_url_policy(self.config.allowed_domains.clone(), self.config.blocked_domains.clone())
            .with_simple_judge(self.enable_simple_judge);

        if let Some(llm) = &self.extraction_llm {
            builder = builder.with_extraction_llm(llm.clone());
        }
        if let Some(fs) = &self.file_system {
            builder = builder.with_file_system(fs.clone());
        }

        builder.build()
    }
}

async fn watch_oom(monitor: &ResourceMonitor) {
    loop {
        if monitor.is_oom() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

fn finished_metrics(mut metrics: SandboxMetrics, start: Instant) -> SandboxMetrics {
    metrics.duration_ms = start.elapsed().as_millis() as i64;
    metrics
}
