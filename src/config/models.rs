use eyre::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{
    API_KEY_ENV_VARS, DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_THINKING_BUDGET, LOG_FILE_PATH,
};
use super::defaults::*;
use super::utils::expand_env;

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Configuration {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogConfig {
    #[serde(default = "log_level")]
    pub level: Option<String>,

    #[serde(default)]
    pub filters: Option<Vec<LogFilter>>,

    #[serde(default)]
    pub file: LogFile,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFilter {
    #[serde(default)]
    pub module: Option<String>,

    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFile {
    #[serde(default = "log_file_path")]
    pub path: String,

    #[serde(default)]
    pub append: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BackendConfig {
    #[serde(default = "endpoint")]
    pub endpoint: String,

    /// May reference environment variables, e.g. `${GEMINI_API_KEY}`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "model")]
    pub model: String,

    /// Bounds the stream-open call and every wait for the next fragment.
    /// Unset means a turn may wait forever.
    #[serde(default)]
    pub timeout_secs: Option<u16>,

    #[serde(default = "thinking_budget")]
    pub thinking_budget: Option<i32>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub enum StorageConfig {
    #[serde(rename = "sqlite")]
    Sqlite(SqliteStorage),
    #[serde(rename = "memory")]
    Memory(MemoryStorage),
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SqliteStorage {
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub max_value_bytes: Option<usize>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct MemoryStorage {
    #[serde(default)]
    pub max_value_bytes: Option<usize>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "no API key configured: set backend.api_key or one of the {} environment variables",
        API_KEY_ENV_VARS.join(", ")
    )]
    MissingCredential,
}

impl Configuration {
    #[cfg(not(test))]
    pub fn instance() -> &'static Configuration {
        super::CONFIG.get_or_init(Configuration::default)
    }

    #[cfg(not(test))]
    pub fn init(config: Configuration) -> Result<()> {
        super::CONFIG
            .set(config)
            .map_err(|_| eyre::eyre!("Config already initialized"))?;
        Ok(())
    }

    #[cfg(test)]
    pub fn instance() -> &'static Configuration {
        use super::TEST_CONFIG;
        TEST_CONFIG.with(|config| *config.borrow())
    }

    #[cfg(test)]
    pub fn init(config: Configuration) -> Result<()> {
        use super::TEST_CONFIG;
        TEST_CONFIG.with(|test_config| {
            *test_config.borrow_mut() = Box::leak(Box::new(config));
        });
        Ok(())
    }
}

impl BackendConfig {
    /// Returns the credential used to call the model. A missing key is a
    /// startup failure, never a per-request one.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = self.api_key.as_deref() {
            let key = expand_env(key);
            if !key.trim().is_empty() {
                return Ok(key.trim().to_string());
            }
        }

        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .ok_or(ConfigError::MissingCredential)
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(|secs| std::time::Duration::from_secs(secs as u64))
    }
}

impl StorageConfig {
    pub fn max_value_bytes(&self) -> Option<usize> {
        match self {
            StorageConfig::Sqlite(sqlite) => sqlite.max_value_bytes,
            StorageConfig::Memory(memory) => memory.max_value_bytes,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Some("info".to_string()),
            file: LogFile::default(),
            filters: None,
        }
    }
}

impl Default for LogFile {
    fn default() -> Self {
        Self {
            path: LOG_FILE_PATH.to_string(),
            append: false,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: None,
            thinking_budget: Some(DEFAULT_THINKING_BUDGET),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Sqlite(SqliteStorage::default())
    }
}
