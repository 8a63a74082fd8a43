//! Entry point for loading and saving the configuration

use crate::file::ConfigFile;
use crate::{Config, ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix of the environment variables that override the file
pub const ENV_PREFIX: &str = "RESTAPIS";

/// Loads, saves and initializes `config.toml`
pub struct ConfigManager {
    dir: PathBuf,
    file: ConfigFile,
}

impl ConfigManager {
    /// Uses the platform config directory
    ///
    /// - Linux: `~/.config/restapis/`
    /// - macOS: `~/Library/Application Support/restapis/`
    /// - Windows: `%APPDATA%\restapis\`
    pub fn new() -> ConfigResult<Self> {
        let dirs = ProjectDirs::from("", "", "restapis").ok_or(ConfigError::NoConfigDir)?;
        Self::with_directory(dirs.config_dir().to_path_buf())
    }

    pub fn with_directory(dir: PathBuf) -> ConfigResult<Self> {
        let file = ConfigFile::in_dir(&dir);
        Ok(Self { dir, file })
    }

    pub fn config_dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Reads the config file
    ///
    /// A missing file yields the defaults; a corrupted one is an error.
    pub fn load(&self) -> ConfigResult<Config> {
        self.file.read()
    }

    /// Reads the config file, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        self.load().unwrap_or_else(|e| {
            log::warn!("{}, using default config", e);
            Config::default()
        })
    }

    /// Validates `config` and writes it
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.file.write(config)
    }

    /// Loads the config, applies `edit` and saves the result
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use restapis_config::ConfigManager;
    /// # let manager = ConfigManager::new().unwrap();
    /// manager.update(|config| {
    ///     config.list.debounce_ms = 50;
    /// }).expect("Failed to update config");
    /// ```
    pub fn update<F>(&self, edit: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        edit(&mut config);
        self.save(&config)
    }

    /// Writes the default config unless a file already exists
    ///
    /// Returns true if a file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.file.exists() {
            return Ok(false);
        }
        self.save(&Config::default())?;
        Ok(true)
    }

    /// Overwrites the file with the defaults
    pub fn reset(&self) -> ConfigResult<()> {
        log::info!("Resetting config at {}", self.file.path().display());
        self.save(&Config::default())
    }

    /// Lists the problems of the current file, empty when valid
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        Ok(match self.load()?.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        })
    }

    /// Loads the file, then applies `RESTAPIS_SECTION_FIELD` variables
    ///
    /// For example `RESTAPIS_LIST_DEBOUNCE_MS=50`. Values that do not parse
    /// are ignored with a warning.
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());

        if let Err(errors) = config.validate() {
            for error in errors {
                log::warn!("After environment overrides: {}", error);
            }
        }
        Ok(config)
    }
}

/// Applies `RESTAPIS_*` overrides read through `lookup`
pub(crate) fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    if let Some(store) = env.get::<String>("LIST_STORE_NAME") {
        config.list.store_name = store;
    }
    if let Some(ms) = env.get("LIST_DEBOUNCE_MS") {
        config.list.debounce_ms = ms;
    }
    if let Some(ms) = env.get("LIST_REQUEST_TIMEOUT_MS") {
        config.list.request_timeout_ms = ms;
    }
    if let Some(auto) = env.get("LIST_AUTO_QUERY") {
        config.list.auto_query = auto;
    }
    if let Some(level) = env.get("APP_LOG_LEVEL") {
        config.app.log_level = level;
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get<T>(&self, name: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let key = format!("{}_{}", ENV_PREFIX, name);
        let raw = (self.lookup)(&key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring {}={:?}: {}", key, raw, e);
                None
            }
        }
    }
}
