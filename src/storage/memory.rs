use std::collections::HashMap;

use async_trait::async_trait;
use eyre::Result;
use tokio::sync::RwLock;

use super::{KeyValueStorage, check_capacity};

/// Process-local storage, used by tests and `storage.memory`.
#[derive(Default)]
pub struct Memory {
    entries: RwLock<HashMap<String, String>>,
    max_value_bytes: Option<usize>,
}

impl Memory {
    pub fn with_max_value_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_value_bytes = limit;
        self
    }
}

#[async_trait]
impl KeyValueStorage for Memory {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        check_capacity(key, value, self.max_value_bytes)?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
