//! Error types for the configuration system

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or storing the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system operation on the config file or its directory failed
    #[error("Could not {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::Config`]
    #[error("Malformed config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// The config file exists but holds no settings
    #[error("Config file {} is empty", .path.display())]
    Empty { path: PathBuf },

    #[error("Could not encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    /// The config has invalid values and was not written
    #[error("Invalid config: {}", join(.0))]
    Invalid(Vec<ValidationError>),

    /// No per-user config directory exists on this platform
    #[error("No user config directory available")]
    NoConfigDir,
}

impl ConfigError {
    /// Builds a mapper from `io::Error` for use with `map_err`
    pub(crate) fn io(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| ConfigError::Io {
            action,
            path,
            source,
        }
    }
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A rejected config value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the field, like `list.debounce_ms`
    pub field: String,
    pub message: String,
    /// Rejected value, when it helps the reader
    pub value: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Attaches the rejected value
    pub fn with_value(mut self, value: impl fmt::Display) -> Self {
        self.value = Some(value.to_string());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {} (got {})", self.field, self.message, value),
            None => write!(f, "{} {}", self.field, self.message),
        }
    }
}

impl std::error::Error for ValidationError {}
