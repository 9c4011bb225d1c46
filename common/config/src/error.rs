//! Error types for configuration management.

use helm_error::ErrorExt;
use helm_error::Location;
use helm_error::StatusCode;
use helm_error::stack_trace_debug;
use snafu::Snafu;
use std::any::Any;

/// Configuration error type.
///
/// Use snafu context selectors from `config_error` module within the crate:
/// ```ignore
/// use crate::error::config_error::*;
/// use snafu::ResultExt;
///
/// fs::read(path).context(IoSnafu { message: "read file" })?;
/// toml::from_str(s).context(TomlParseSnafu { file: "config.toml" })?;
/// ```
#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum ConfigError {
    /// I/O or system error (wraps std::io::Error).
    #[snafu(display("IO error: {message}"))]
    Io {
        message: String,
        #[snafu(source)]
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// TOML parsing error.
    #[snafu(display("Config error in {file}: {message}"))]
    Parse {
        file: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// Configuration validation error (values present but out of range).
    #[snafu(display("Invalid config in {file}: {message}"))]
    Validation {
        file: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// Internal error (lock poisoning, unexpected state, etc).
    #[snafu(display("Internal error: {message}"))]
    Internal {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for ConfigError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Io { .. } => StatusCode::IoError,
            Self::Parse { .. } | Self::Validation { .. } => StatusCode::InvalidConfig,
            Self::Internal { .. } => StatusCode::Internal,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
