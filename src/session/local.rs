use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum LocalStoreError {
    #[error("local cache io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("local cache entry does not match the expected shape: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Key holding the identity that was signed in when the process last exited.
pub const CURRENT_USER_KEY: &str = "tikva-user";

pub fn cart_key(email: &str) -> String {
    format!("tikva-cart-{email}")
}

/// Durable key-value cache for the headless session, one JSON file on disk.
/// Plays the role browser local storage plays for the web storefront.
pub struct LocalStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, Value>>,
}

impl LocalStore {
    /// Open the cache at `path` and load what is there. A missing file is an
    /// empty cache; an unreadable one is logged and dropped rather than
    /// taking the session down.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, LocalStoreError> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        path = %path.display(),
                        "local cache unreadable, starting empty"
                    );
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, LocalStoreError> {
        let entries = self.entries.lock().await;
        match entries.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), LocalStoreError> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), serde_json::to_value(value)?);
        self.persist(&entries).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), LocalStoreError> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
        }
        Ok(())
    }

    /// Write the whole map through a temp file so a crash mid-write cannot
    /// leave a half-written cache behind.
    async fn persist(&self, entries: &HashMap<String, Value>) -> Result<(), LocalStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp = tmp_path(&self.path);
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("cache");
    path.with_file_name(format!(".{name}.tmp.{}", std::process::id()))
}

#[cfg(test)]
mod tests {
    use crate::models::CartRecord;

    use super::*;

    #[tokio::test]
    async fn entries_survive_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.json");

        let store = LocalStore::open(&path).await.unwrap();
        store
            .set(CURRENT_USER_KEY, &"ana@example.com".to_string())
            .await
            .unwrap();
        store
            .set(&cart_key("ana@example.com"), &CartRecord::empty())
            .await
            .unwrap();
        drop(store);

        let reopened = LocalStore::open(&path).await.unwrap();
        let user: Option<String> = reopened.get(CURRENT_USER_KEY).await.unwrap();
        assert_eq!(user.as_deref(), Some("ana@example.com"));
        let cart: Option<CartRecord> = reopened.get(&cart_key("ana@example.com")).await.unwrap();
        assert!(cart.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_deletes_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("cache.json")).await.unwrap();

        store.set("a", &1_i64).await.unwrap();
        store.remove("a").await.unwrap();
        // Removing an absent key is fine.
        store.remove("a").await.unwrap();

        let value: Option<i64> = store.get("a").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn missing_file_means_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("never-written.json"))
            .await
            .unwrap();

        let value: Option<String> = store.get(CURRENT_USER_KEY).await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty_instead_of_failing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        tokio::fs::write(&path, b"not json at all").await.unwrap();

        let store = LocalStore::open(&path).await.unwrap();
        let value: Option<String> = store.get("anything").await.unwrap();
        assert_eq!(value, None);

        // And it is usable afterwards.
        store.set("k", &"v".to_string()).await.unwrap();
        let value: Option<String> = store.get("k").await.unwrap();
        assert_eq!(value.as_deref(), Some("v"));
    }
}
