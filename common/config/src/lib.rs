//! Layered run configuration for the agent workspace.
//!
//! Configuration is resolved defaults → `config.toml` → environment
//! overrides (§10.3); the binary crate applies a final runtime-overrides
//! layer on top of what [`ConfigLoader::load_all`] returns.
//!
//! # Example
//!
//! ```no_run
//! use helm_config::ConfigLoader;
//!
//! let loader = ConfigLoader::default_dir();
//! let config = loader.load_all();
//! println!("step limit: {}", config.loop_config.step_limit);
//! ```

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use loader::DEFAULT_CONFIG_DIR;
pub use loader::HELM_HOME_ENV;
pub use loader::HELM_MAX_COST_USD_ENV;
pub use loader::HELM_STEP_LIMIT_ENV;
pub use loader::RUN_CONFIG_FILE;
pub use loader::default_config_dir;
pub use loader::find_config_home;
pub use types::BudgetPolicyConfig;
pub use types::CompactionConfig;
pub use types::LoopConfig;
pub use types::RunConfig;
pub use types::SandboxCapsConfig;
pub use types::StallConfig;
