use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::client::{ApiClient, ApiError};
use crate::models::CartRecord;
use crate::session::local::{self, LocalStore, LocalStoreError};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Local(#[from] LocalStoreError),
}

/// One sink a cart can be mirrored to.
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn load(&self, email: &str) -> Result<Option<CartRecord>, RepositoryError>;

    async fn save(&self, email: &str, record: &CartRecord) -> Result<(), RepositoryError>;
}

/// Cart storage in the session's local cache file.
pub struct LocalCartCache {
    store: Arc<LocalStore>,
}

impl LocalCartCache {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CartRepository for LocalCartCache {
    async fn load(&self, email: &str) -> Result<Option<CartRecord>, RepositoryError> {
        Ok(self.store.get(&local::cart_key(email)).await?)
    }

    async fn save(&self, email: &str, record: &CartRecord) -> Result<(), RepositoryError> {
        self.store.set(&local::cart_key(email), record).await?;
        Ok(())
    }
}

/// Cart storage behind the REST API.
pub struct ApiCartStore {
    client: ApiClient,
}

impl ApiCartStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CartRepository for ApiCartStore {
    async fn load(&self, email: &str) -> Result<Option<CartRecord>, RepositoryError> {
        Ok(self.client.cart(email).await?)
    }

    async fn save(&self, email: &str, record: &CartRecord) -> Result<(), RepositoryError> {
        self.client.save_cart(email, record).await?;
        Ok(())
    }
}
