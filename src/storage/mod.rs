pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use eyre::{Context, Result};
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use crate::config::{StorageConfig, default_data_path, init_parent_dir, resolve_path};
use memory::Memory;
use sqlite::Sqlite;

/// Key holding the JSON array of conversations, most recent first.
pub const CONVERSATIONS_KEY: &str = "conversations";

/// Key holding the active conversation id as a bare JSON string.
pub const ACTIVE_CONVERSATION_KEY: &str = "activeConversationId";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("value for key {key} is {size} bytes, limit is {limit} bytes")]
    CapacityExceeded {
        key: String,
        size: usize,
        limit: usize,
    },
}

/// Durable key/value primitives the conversation store persists through.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeyValueStorage {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

pub type ArcStorage = Arc<dyn KeyValueStorage + Send + Sync>;

pub async fn new_storage(config: &StorageConfig) -> Result<ArcStorage> {
    let storage: ArcStorage = match config {
        StorageConfig::Sqlite(sqlite_config) => {
            let path = match sqlite_config.path.as_deref() {
                Some(path) => {
                    resolve_path(path).wrap_err(format!("resolving database path {}", path))?
                }
                None => default_data_path(),
            };
            init_parent_dir(&path)?;
            log::debug!("Opening sqlite storage at {}", path);

            let sqlite = Sqlite::new(Some(&path))
                .await?
                .with_max_value_bytes(sqlite_config.max_value_bytes);
            sqlite.run_migration().await?;
            Arc::new(sqlite)
        }
        StorageConfig::Memory(memory_config) => {
            log::debug!("Using in-memory storage, nothing survives a restart");
            Arc::new(Memory::default().with_max_value_bytes(memory_config.max_value_bytes))
        }
    };
    Ok(storage)
}

pub(crate) fn check_capacity(
    key: &str,
    value: &str,
    limit: Option<usize>,
) -> Result<(), StorageError> {
    match limit {
        Some(limit) if value.len() > limit => Err(StorageError::CapacityExceeded {
            key: key.to_string(),
            size: value.len(),
            limit,
        }),
        _ => Ok(()),
    }
}
