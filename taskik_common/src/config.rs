//! TOML configuration loading.
//!
//! Any `Deserialize` type gets [`ConfigLoader`] through a blanket impl, so
//! the controller config and the chain description load the same way. The
//! `[shared]` table holds what every taskik binary reads before anything
//! else: its instance name and log level.
//!
//! ```toml
//! [shared]
//! service_name = "taskik-cu"
//! log_level = "debug"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to read, parse or validate a configuration file.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// No file at the given path.
    #[error("configuration file {} not found", .0.display())]
    FileNotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("cannot read {}: {reason}", .path.display())]
    Unreadable {
        /// File that failed.
        path: PathBuf,
        /// OS error text.
        reason: String,
    },

    /// Not valid TOML, or the TOML does not match the expected layout.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// Parsed, but a value is out of range.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log verbosity selected in `[shared]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive for `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// `[shared]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Instance name used in log output.
    pub service_name: String,

    #[serde(default)]
    pub log_level: LogLevel,
}

impl SharedConfig {
    /// Reject an empty `service_name`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "shared.service_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load a TOML-described value from a file or a string.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Read and parse `path`.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
            _ => ConfigError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;
        Self::load_str(&text)
    }

    /// Parse in-memory TOML.
    fn load_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
