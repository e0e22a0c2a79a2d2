//! User configuration settings
//!
//! Layered configuration: defaults → config file → environment variables

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};
use crate::git::GitExecutor;

/// Library configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Git binary name or path
    pub git_binary: String,

    /// Maximum concurrent git processes
    pub max_concurrent: usize,

    /// Per-command timeout in seconds; unset means wait for git to finish
    pub timeout_secs: Option<u64>,

    /// Enable debug logging
    pub debug: bool,

    /// Log file path (if set, logs to file instead of stderr)
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            git_binary: "git".to_string(),
            max_concurrent: 16,
            timeout_secs: None,
            debug: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load configuration using a specific config file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config: Config = Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Config::default()))
            // Layer config file if it exists
            .merge(Toml::file(config_path))
            // Layer environment variables (GITWRAPPER_GIT_BINARY, etc.)
            .merge(Env::prefixed("GITWRAPPER_"))
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Command timeout as a `Duration`, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Build an executor from these settings
    pub fn executor(&self) -> GitExecutor {
        let executor =
            GitExecutor::with_max_concurrent(self.max_concurrent).with_binary(&self.git_binary);
        match self.timeout() {
            Some(timeout) => executor.with_timeout(timeout),
            None => executor,
        }
    }

    /// Save current configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save current configuration to `config_path`
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|_e| {
                Error::Config(ConfigError::DirectoryCreationFailed(parent.to_path_buf()))
            })?;
        }

        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        std::fs::write(config_path, toml)
            .map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("org", "gitwrapper", "gitwrapper").ok_or_else(|| {
            Error::Config(ConfigError::LoadFailed(
                "Could not determine home directory".to_string(),
            ))
        })
    }
}
