//! Configuration loading and database path resolution
//!
//! Database path priority:
//! 1. Command-line argument (highest priority)
//! 2. `MONEY_MANAGER_DB` environment variable
//! 3. `database_path` in the TOML config file
//! 4. OS-dependent default under the local data directory

use crate::error::{Error, Result};
use crate::pagination::DEFAULT_PAGE_SIZE;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DB_ENV_VAR: &str = "MONEY_MANAGER_DB";

const APP_DIR: &str = "money-manager";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind_address: String,
    pub default_page_size: u32,
    pub busy_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: default_database_path(),
            bind_address: "127.0.0.1:3000".to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            busy_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Resolve the effective configuration.
    ///
    /// An explicitly named config file must exist; the default location is
    /// optional.
    pub fn load(config_file: Option<&Path>, db_arg: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => match default_config_file() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Config::default(),
            },
        };

        config.database_path = resolve_database_path(
            db_arg,
            std::env::var(DB_ENV_VAR).ok().as_deref(),
            config.database_path,
        );

        if config.default_page_size == 0 {
            return Err(Error::Config("default_page_size must be at least 1".to_string()));
        }

        Ok(config)
    }
}

/// CLI argument beats the environment, which beats the file/default value
fn resolve_database_path(cli_arg: Option<&Path>, env_value: Option<&str>, configured: PathBuf) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    match env_value {
        Some(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => configured,
    }
}

/// `<config_dir>/money-manager/config.toml`
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
        .join("money.db")
}
