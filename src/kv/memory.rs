use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{KvError, KvStore};

/// In-memory backend used when no `DATABASE_URL` is configured, and by the
/// test suites. The `BTreeMap` keeps keys ordered so prefix scans come back
/// sorted exactly like the Postgres backend's.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<Value>, KvError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), KvError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Value>, KvError> {
        let entries = self.entries.read().await;
        let values = entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, value)| value.clone())
            .collect();
        Ok(values)
    }

    async fn delete(&self, key: &str) -> Result<bool, KvError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}
