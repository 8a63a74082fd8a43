//! Reading and writing `config.toml`

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub(crate) const FILE_NAME: &str = "config.toml";
const BACKUP_EXTENSION: &str = "toml.backup";

/// The config file on disk
pub(crate) struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub(crate) fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(FILE_NAME),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn backup_path(&self) -> PathBuf {
        self.path.with_extension(BACKUP_EXTENSION)
    }

    pub(crate) fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the file, or the defaults when there is none
    ///
    /// An empty or malformed file is an error. Out-of-range values are only
    /// logged, so the user can still fix them by hand.
    pub(crate) fn read(&self) -> ConfigResult<Config> {
        if !self.exists() {
            log::debug!("No config at {}, using defaults", self.path.display());
            return Ok(Config::default());
        }

        let text = fs::read_to_string(&self.path).map_err(ConfigError::io("read", &self.path))?;
        if text.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: self.path.clone(),
            });
        }

        let mut config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;

        if config.version != CONFIG_VERSION {
            log::warn!(
                "{} has format version {}, reading it as version {}",
                self.path.display(),
                config.version,
                CONFIG_VERSION
            );
            config.version = CONFIG_VERSION;
        }

        if let Err(errors) = config.validate() {
            for error in &errors {
                log::warn!("{}: {}", self.path.display(), error);
            }
        }

        Ok(config)
    }

    /// Validates `config` and replaces the file in one rename
    ///
    /// The previous file, if any, is copied to `config.toml.backup` first.
    pub(crate) fn write(&self, config: &Config) -> ConfigResult<()> {
        config.validate().map_err(ConfigError::Invalid)?;
        let text = toml::to_string_pretty(config)?;

        let dir = self.path.parent().ok_or(ConfigError::NoConfigDir)?;
        fs::create_dir_all(dir).map_err(ConfigError::io("create", dir))?;

        if self.exists() {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup).map_err(ConfigError::io("back up", &self.path))?;
            log::debug!("Previous config kept at {}", backup.display());
        }

        let mut staged = tempfile::Builder::new()
            .prefix(".config")
            .suffix(".toml.tmp")
            .tempfile_in(dir)
            .map_err(ConfigError::io("stage", dir))?;
        staged
            .write_all(text.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(ConfigError::io("write", staged.path()))?;
        staged
            .persist(&self.path)
            .map_err(|e| ConfigError::io("replace", &self.path)(e.error))?;

        log::info!("Config written to {}", self.path.display());
        Ok(())
    }
}
