//! helm - thin process wiring for the web-automation agent engine (§10.5).
//!
//! Parses a task description and run configuration from CLI flags and/or
//! `~/.helm/config.toml`, constructs the collaborators, wraps the Step Loop
//! in the Sandbox Supervisor, runs it to completion, and prints the
//! `SandboxResult` as JSON. Production browser/model collaborators are
//! supplied by embedding code (§1); `--dry-run` drives the scripted fakes
//! in [`fakes`] instead.

mod fakes;

use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use helm_commands::default_catalog;
use helm_config::ConfigLoader;
use helm_config::RunConfig;
use helm_model::PricingTable;
use helm_sandbox::BrowserFactory;
use helm_sandbox::SandboxSupervisorBuilder;
use helm_sandbox::SupervisorError;

#[derive(Parser)]
#[command(name = "helm", version, about = "Run a task through the web-automation agent engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task to completion and print the SandboxResult as JSON.
    Run {
        /// The task description handed to the agent.
        task: String,

        /// Model id to invoke (overrides config.toml).
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum steps before giving up (overrides config.toml).
        #[arg(long)]
        step_limit: Option<i64>,

        /// Drive scripted fakes instead of real collaborators.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Print the resolved run configuration as JSON.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _telemetry = helm_otel::init_tracing("helm-cli");
    let cli = Cli::parse();
    let config = ConfigLoader::default_dir().load_all();

    match cli.command {
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Run {
            task,
            model,
            step_limit,
            dry_run,
        } => run_task(&task, model, step_limit, dry_run, config).await,
    }
}

async fn run_task(task: &str, model: Option<String>, step_limit: Option<i64>, dry_run: bool, mut config: RunConfig) -> anyhow::Result<()> {
    if let Some(limit) = step_limit {
        config.loop_config.step_limit = limit;
    }
    let model_id = model.or(config.model_id.clone()).unwrap_or_else(|| "dry-run-model".to_string());

    if !dry_run {
        anyhow::bail!(
            "no production browser/model collaborators are wired into this binary; pass --dry-run, \
             or embed helm-loop/helm-sandbox directly with your own collaborators"
        );
    }

    let sandbox_config = helm_protocol::sandbox::SandboxConfig {
        timeout_ms: config.sandbox.timeout_ms,
        max_memory_mb: config.sandbox.max_memory_mb,
        allowed_domains: config.sandbox.allowed_domains.clone(),
        blocked_domains: config.sandbox.blocked_domains.clone(),
        enable_networking: config.sandbox.enable_networking,
        enable_file_access: config.sandbox.enable_file_access,
        work_dir: std::env::temp_dir().join("helm-dry-run"),
        resource_check_interval_ms: config.sandbox.resource_check_interval_ms,
        capture_output: config.sandbox.capture_output,
        step_limit: config.loop_config.step_limit,
    };

    let model = Arc::new(fakes::DryRunModel::new(model_id));
    let catalog = Arc::new(default_catalog());
    let file_system = Arc::new(fakes::DryRunFileAccess::new(sandbox_config.work_dir.clone()));
    let supervisor = SandboxSupervisorBuilder::new(sandbox_config, Arc::new(DryRunBrowserFactory), model, catalog)
        .with_loop_config(config.loop_config.clone())
        .with_pricing(PricingTable::default())
        .with_file_system(file_system)
        .build();

    let result = supervisor.run(task).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Hands the supervisor a fresh dry-run browser/analyzer pair per run.
struct DryRunBrowserFactory;

#[async_trait::async_trait]
impl BrowserFactory for DryRunBrowserFactory {
    async fn create(
        &self,
        _config: &helm_protocol::sandbox::SandboxConfig,
    ) -> Result<(Arc<dyn helm_commands::BrowserCollaborator>, Arc<dyn helm_commands::PageAnalyzer>), SupervisorError> {
        Ok((Arc::new(fakes::DryRunBrowser::new()), Arc::new(fakes::DryRunAnalyzer)))
    }
}
