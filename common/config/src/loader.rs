//! Configuration file loading.
//!
//! Loads [`RunConfig`] from a TOML file in the config directory, falling
//! back to built-in defaults when the file or any field is missing, and
//! applying a small set of environment overrides on top.

use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::warn;

use crate::error::ConfigError;
use crate::error::config_error::IoSnafu;
use crate::error::config_error::ParseSnafu;
use crate::types::RunConfig;
use snafu::ResultExt;

/// Default configuration directory name.
pub const DEFAULT_CONFIG_DIR: &str = ".helm";

/// Run configuration file name.
pub const RUN_CONFIG_FILE: &str = "config.toml";

/// Environment variable for a custom config home directory.
pub const HELM_HOME_ENV: &str = "HELM_HOME";

/// Environment variable overriding the cost budget ceiling.
pub const HELM_MAX_COST_USD_ENV: &str = "HELM_MAX_COST_USD";

/// Environment variable overriding the step limit.
pub const HELM_STEP_LIMIT_ENV: &str = "HELM_STEP_LIMIT";

/// Get the default configuration directory path (`~/.helm`).
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_CONFIG_DIR)
}

/// Find the config home directory, honouring `HELM_HOME` if set.
pub fn find_config_home() -> PathBuf {
    if let Ok(custom_home) = std::env::var(HELM_HOME_ENV) {
        let path = PathBuf::from(&custom_home);
        if path.is_absolute() {
            return path;
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(&custom_home))
            .unwrap_or_else(|_| PathBuf::from(custom_home))
    } else {
        default_config_dir()
    }
}

/// Loads [`RunConfig`] from a directory containing `config.toml`.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn default_dir() -> Self {
        Self {
            config_dir: default_config_dir(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            config_dir: path.as_ref().to_path_buf(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn ensure_dir(&self) -> Result<(), ConfigError> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir).context(IoSnafu {
                message: format!("create config directory {}", self.config_dir.display()),
            })?;
            debug!(path = %self.config_dir.display(), "created config directory");
        }
        Ok(())
    }

    /// Load `config.toml`, or [`RunConfig::default`] if it doesn't exist or is empty.
    pub fn load_run_config(&self) -> Result<RunConfig, ConfigError> {
        let path = self.config_dir.join(RUN_CONFIG_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "config.toml not found, using defaults");
            return Ok(RunConfig::default());
        }

        let content = std::fs::read_to_string(&path).context(IoSnafu {
            message: format!("read {}", path.display()),
        })?;

        if content.trim().is_empty() {
            debug!(path = %path.display(), "config.toml is empty, using defaults");
            return Ok(RunConfig::default());
        }

        toml::from_str(&content).context(ParseSnafu {
            file: path.display().to_string(),
            message: "invalid TOML".to_string(),
        })
    }

    /// Load `config.toml` and apply environment overrides (§10.3 layering:
    /// defaults → file → env → runtime overrides; the runtime layer is
    /// applied by callers after this returns).
    pub fn load_all(&self) -> RunConfig {
        let mut config = self.load_run_config().unwrap_or_else(|err| {
            warn!(error = %err, "failed to load config.toml, using defaults");
            RunConfig::default()
        });
        apply_env_overrides(&mut config);
        config
    }
}

fn apply_env_overrides(config: &mut RunConfig) {
    if let Ok(raw) = std::env::var(HELM_MAX_COST_USD_ENV) {
        match raw.parse::<f64>() {
            Ok(value) => config.budget.max_cost_usd = value,
            Err(_) => warn!(raw, "ignoring invalid {HELM_MAX_COST_USD_ENV}"),
        }
    }
    if let Ok(raw) = std::env::var(HELM_STEP_LIMIT_ENV) {
        match raw.parse::<i64>() {
            Ok(value) => config.loop_config.step_limit = value,
            Err(_) => warn!(raw, "ignoring invalid {HELM_STEP_LIMIT_ENV}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_temp_config() -> (TempDir, ConfigLoader) {
        let temp_dir = TempDir::new().expect("tempdir");
        let loader = ConfigLoader::from_path(temp_dir.path());
        (temp_dir, loader)
    }

    #[test]
    fn missing_file_loads_defaults() {
        let loader = ConfigLoader::from_path("/nonexistent/path");
        let config = loader.load_run_config().expect("defaults");
        assert_eq!(config.loop_config.step_limit, 50);
    }

    #[test]
    fn ensure_dir_creates_missing_directory() {
        let temp_dir = TempDir::new().expect("tempdir");
        let config_path = temp_dir.path().join("nested");
        let loader = ConfigLoader::from_path(&config_path);

        assert!(!config_path.exists());
        loader.ensure_dir().expect("create dir");
        assert!(config_path.exists());
    }

    #[test]
    fn loads_and_parses_config_toml() {
        let (temp_dir, loader) = create_temp_config();
        std::fs::write(
            temp_dir.path().join(RUN_CONFIG_FILE),
            "model_id = \"gpt-4o\"\n\n[loop]\nstep_limit = 10\n",
        )
        .expect("write config.toml");

        let config = loader.load_run_config().expect("load");
        assert_eq!(config.model_id.as_deref(), Some("gpt-4o"));
        assert_eq!(config.loop_config.step_limit, 10);
    }

    #[test]
    fn empty_file_loads_defaults() {
        let (temp_dir, loader) = create_temp_config();
        std::fs::write(temp_dir.path().join(RUN_CONFIG_FILE), "").expect("write");
        let config = loader.load_run_config().expect("load");
        assert_eq!(config.loop_config.step_limit, 50);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let (temp_dir, loader) = create_temp_config();
        std::fs::write(temp_dir.path().join(RUN_CONFIG_FILE), "not valid toml {{{").expect("write");
        let result = loader.load_run_config();
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse { .. }));
    }

    #[test]
    fn env_override_replaces_budget_ceiling() {
        let (_temp_dir, loader) = create_temp_config();
        // SAFETY: test runs single-threaded with respect to this var within this process.
        unsafe {
            std::env::set_var(HELM_MAX_COST_USD_ENV, "2.5");
        }
        let config = loader.load_all();
        unsafe {
            std::env::remove_var(HELM_MAX_COST_USD_ENV);
        }
        assert!((config.budget.max_cost_usd - 2.5).abs() < f64::EPSILON);
    }
}
