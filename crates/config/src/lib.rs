//! REST APIs list configuration
//!
//! Settings live in `config.toml` under the user config directory, one TOML
//! table per section. Each section implements [`ConfigSection`]. Missing
//! keys take their defaults, out-of-range values load with a warning but are
//! never written back, and `RESTAPIS_*` variables override the file.
//!
//! # Example
//!
//! ```rust
//! use restapis_config::{Config, ConfigManager};
//!
//! let dir = tempfile::tempdir().expect("temp dir");
//! let manager = ConfigManager::with_directory(dir.path().to_path_buf()).expect("manager");
//! let config = manager.load().unwrap_or_else(|e| {
//!     eprintln!("Config error: {}, using defaults", e);
//!     Config::default()
//! });
//!
//! assert_eq!(config.list.store_name, "api-index");
//! ```

mod error;
mod manager;
mod file;
mod validation;

// Config sections
mod app_config;
mod list_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{ConfigManager, ENV_PREFIX};
pub use validation::{rules, ConfigSection};

pub use app_config::{AppConfig, LogLevel};
pub use list_config::{ListConfig, ALL_STORES};

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// List synchronization settings
    pub list: ListConfig,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<_> = [self.app.validate(), self.list.validate()]
            .into_iter()
            .filter_map(Result::err)
            .flatten()
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Takes every section from `other`
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.list.merge(other.list);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            list: ListConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_version_is_set() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        let mut override_config = Config::default();
        override_config.list.debounce_ms = 75;

        base.merge(override_config);
        assert_eq!(base.list.debounce_ms, 75);
    }

    #[test]
    fn test_validate_collects_all_sections() {
        let mut config = Config::default();
        config.list.store_name = String::new();
        config.list.debounce_ms = 10_000;

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
