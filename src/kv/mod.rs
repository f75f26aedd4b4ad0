use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryKv;
pub use postgres::PostgresKv;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("key-value backend unavailable: {0}")]
    Backend(#[from] sqlx::Error),
    #[error("stored value does not match the expected shape: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Storage contract the rest of the backend is written against. Values are
/// opaque JSON documents; callers that want typed access go through
/// [`get_as`] and [`set_as`].
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, KvError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), KvError>;

    /// Every value whose key starts with `prefix`, ordered by key.
    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Value>, KvError>;

    /// Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool, KvError>;
}

/// Typed read. An absent key is `Ok(None)`; a present value that fails to
/// deserialize is a [`KvError::Codec`].
pub async fn get_as<T>(kv: &dyn KvStore, key: &str) -> Result<Option<T>, KvError>
where
    T: DeserializeOwned,
{
    match kv.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn set_as<T>(kv: &dyn KvStore, key: &str, value: &T) -> Result<(), KvError>
where
    T: Serialize,
{
    kv.set(key, serde_json::to_value(value)?).await
}

pub mod keys {
    use uuid::Uuid;

    pub const EXCHANGE_RATES: &str = "exchange-rates";
    pub const PRODUCT_PREFIX: &str = "product:";
    pub const AUDIT_PREFIX: &str = "audit:";

    pub fn product(id: &str) -> String {
        format!("{PRODUCT_PREFIX}{id}")
    }

    pub fn user(email: &str) -> String {
        format!("user:{email}")
    }

    pub fn cart(email: &str) -> String {
        format!("cart:{email}")
    }

    /// Millisecond timestamp first and zero-padded, so a prefix scan yields
    /// audit entries in chronological order.
    pub fn audit(at_millis: i64, id: Uuid) -> String {
        format!("{AUDIT_PREFIX}{at_millis:020}:{id}")
    }
}
