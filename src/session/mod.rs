//! Headless storefront session: the signed-in identity, the in-memory cart,
//! and the persistence that follows both around.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::cart::{CartError, CartStore};
use crate::checkout;
use crate::client::{ApiClient, ApiError};
use crate::dto::auth::AuthData;
use crate::models::{Currency, ExchangeRates, Product, UserProfile};
use crate::pricing::PriceError;
use crate::session::local::{CURRENT_USER_KEY, LocalStore, LocalStoreError};
use crate::session::mirror::PersistenceMirror;
use crate::session::repository::{ApiCartStore, LocalCartCache};

pub mod local;
pub mod mirror;
pub mod repository;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("sign in to manage the cart")]
    LoginRequired,

    #[error("the cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Price(#[from] PriceError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    LocalCache(#[from] LocalStoreError),

    #[error("could not build the order link: {0}")]
    Link(#[from] url::ParseError),
}

/// Authentication backend the session talks to.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_up(&self, name: &str, email: &str, password: &str)
    -> Result<AuthData, ApiError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthData, ApiError>;

    async fn adopt(&self, token: String);

    async fn sign_out(&self);
}

#[async_trait]
impl AuthGateway for ApiClient {
    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthData, ApiError> {
        self.signup(name, email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthData, ApiError> {
        self.signin(email, password).await
    }

    async fn adopt(&self, token: String) {
        self.adopt_token(token).await;
    }

    async fn sign_out(&self) {
        ApiClient::sign_out(self).await;
    }
}

/// What gets cached on disk so the next process start can resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub user: UserProfile,
    pub token: String,
}

/// One user-facing storefront session: `anonymous` until login or restore,
/// `authenticated` after. Cart mutations require an identity; every mutation
/// is mirrored in the background, and logout flushes synchronously before
/// clearing.
pub struct StorefrontSession {
    gateway: Arc<dyn AuthGateway>,
    mirror: PersistenceMirror,
    local: Arc<LocalStore>,
    cart: CartStore,
    identity: Option<UserProfile>,
    whatsapp_phone: String,
}

impl StorefrontSession {
    /// Wire a session against a backend and a local cache file.
    pub async fn connect(
        base_url: Url,
        cache_path: impl Into<PathBuf>,
    ) -> Result<Self, SessionError> {
        let client = ApiClient::new(base_url);
        let local = Arc::new(LocalStore::open(cache_path).await?);
        let mirror = PersistenceMirror::new(
            Arc::new(LocalCartCache::new(local.clone())),
            Arc::new(ApiCartStore::new(client.clone())),
        );
        Ok(Self::new(Arc::new(client), mirror, local))
    }

    /// Assemble a session from its parts; [`StorefrontSession::connect`] is
    /// the usual entry point.
    pub fn new(
        gateway: Arc<dyn AuthGateway>,
        mirror: PersistenceMirror,
        local: Arc<LocalStore>,
    ) -> Self {
        Self {
            gateway,
            mirror,
            local,
            cart: CartStore::new(),
            identity: None,
            whatsapp_phone: checkout::ORDER_PHONE.to_string(),
        }
    }

    pub fn with_whatsapp_phone(mut self, phone: impl Into<String>) -> Self {
        self.whatsapp_phone = phone.into();
        self
    }

    /// Resume the previous session if a usable one is cached. An expired
    /// token is not detected here; the next API call fails with 401 and the
    /// caller sends the user back to login.
    pub async fn restore(&mut self) -> Result<Option<UserProfile>, SessionError> {
        let stored: Option<StoredSession> = self.local.get(CURRENT_USER_KEY).await?;
        let Some(stored) = stored else {
            return Ok(None);
        };

        self.gateway.adopt(stored.token).await;
        let record = self.mirror.restore(&stored.user.email).await;
        self.cart.load(record);
        self.identity = Some(stored.user.clone());
        Ok(Some(stored.user))
    }

    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, SessionError> {
        let auth = self.gateway.sign_up(name, email, password).await?;
        Ok(self.install_identity(auth).await)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserProfile, SessionError> {
        let auth = self.gateway.sign_in(email, password).await?;
        Ok(self.install_identity(auth).await)
    }

    async fn install_identity(&mut self, auth: AuthData) -> UserProfile {
        let stored = StoredSession {
            user: auth.user.clone(),
            token: auth.token,
        };
        if let Err(err) = self.local.set(CURRENT_USER_KEY, &stored).await {
            tracing::warn!(error = %err, "failed to cache the signed-in identity");
        }

        let record = self.mirror.restore(&auth.user.email).await;
        self.cart.load(record);
        self.identity = Some(auth.user.clone());
        auth.user
    }

    pub async fn logout(&mut self) {
        if let Some(user) = self.identity.take() {
            let record = self.cart.snapshot();
            self.mirror.flush(&user.email, &record).await;
            if let Err(err) = self.local.remove(CURRENT_USER_KEY).await {
                tracing::warn!(error = %err, "failed to forget the cached identity");
            }
        }
        self.cart.clear();
        self.gateway.sign_out().await;
    }

    pub fn current_user(&self) -> Option<&UserProfile> {
        self.identity.as_ref()
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    pub fn total(&self) -> f64 {
        self.cart.total()
    }

    pub async fn add_to_cart(&mut self, product: Product, quantity: u32) -> Result<(), SessionError> {
        let email = self.require_identity()?.email.clone();
        self.cart.add(product, quantity)?;
        self.persist(&email).await;
        Ok(())
    }

    pub async fn set_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), SessionError> {
        let email = self.require_identity()?.email.clone();
        self.cart.set_quantity(product_id, quantity)?;
        self.persist(&email).await;
        Ok(())
    }

    pub async fn remove_from_cart(&mut self, product_id: &str) -> Result<bool, SessionError> {
        let email = self.require_identity()?.email.clone();
        let removed = self.cart.remove(product_id);
        if removed {
            self.persist(&email).await;
        }
        Ok(removed)
    }

    /// WhatsApp deep link for the current cart, priced in `currency`.
    pub fn checkout_link(
        &self,
        currency: Currency,
        rates: &ExchangeRates,
    ) -> Result<Url, SessionError> {
        let user = self.require_identity()?;
        if self.cart.is_empty() {
            return Err(SessionError::EmptyCart);
        }

        let message = checkout::order_message(self.cart.lines(), user, currency, rates)?;
        Ok(checkout::order_link(&self.whatsapp_phone, &message)?)
    }

    fn require_identity(&self) -> Result<&UserProfile, SessionError> {
        self.identity.as_ref().ok_or(SessionError::LoginRequired)
    }

    async fn persist(&self, email: &str) {
        // The handle is not awaited; failures are logged inside the mirror.
        let _ = self.mirror.save_background(email, self.cart.snapshot()).await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use tokio::sync::Mutex;

    use crate::models::{CartRecord, Category, Role};
    use crate::session::repository::CartRepository;

    use super::*;

    struct FakeGateway {
        users: Mutex<HashMap<String, (String, UserProfile)>>,
        token: Mutex<Option<String>>,
    }

    impl FakeGateway {
        fn new() -> Self {
            Self {
                users: Mutex::new(HashMap::new()),
                token: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl AuthGateway for FakeGateway {
        async fn sign_up(
            &self,
            name: &str,
            email: &str,
            password: &str,
        ) -> Result<AuthData, ApiError> {
            let profile = UserProfile {
                name: name.to_string(),
                email: email.to_string(),
                role: Role::Customer,
                registered_at: Utc::now(),
            };
            self.users.lock().await.insert(
                email.to_string(),
                (password.to_string(), profile.clone()),
            );
            let token = format!("Bearer fake-{email}");
            *self.token.lock().await = Some(token.clone());
            Ok(AuthData {
                user: profile,
                token,
            })
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<AuthData, ApiError> {
            let users = self.users.lock().await;
            match users.get(email) {
                Some((stored, profile)) if stored == password => {
                    let token = format!("Bearer fake-{email}");
                    *self.token.lock().await = Some(token.clone());
                    Ok(AuthData {
                        user: profile.clone(),
                        token,
                    })
                }
                _ => Err(ApiError::Api {
                    status: 401,
                    message: "Invalid email or password".to_string(),
                }),
            }
        }

        async fn adopt(&self, token: String) {
            *self.token.lock().await = Some(token);
        }

        async fn sign_out(&self) {
            *self.token.lock().await = None;
        }
    }

    fn product(id: &str, price: f64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Producto {id}"),
            category: Category::Zapatillas,
            image: String::new(),
            price,
            box_price: None,
            sizes: None,
            stock: None,
        }
    }

    /// Session whose "remote" sink is a second local cache file, so the
    /// whole mirror composition runs without a server.
    async fn session_in(dir: &std::path::Path) -> (StorefrontSession, Arc<LocalStore>) {
        let local = Arc::new(LocalStore::open(dir.join("cache.json")).await.unwrap());
        let remote_store = Arc::new(LocalStore::open(dir.join("remote.json")).await.unwrap());
        let mirror = PersistenceMirror::new(
            Arc::new(LocalCartCache::new(local.clone())),
            Arc::new(LocalCartCache::new(remote_store.clone())),
        );
        let session = StorefrontSession::new(Arc::new(FakeGateway::new()), mirror, local);
        (session, remote_store)
    }

    #[tokio::test]
    async fn anonymous_cart_mutations_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _) = session_in(dir.path()).await;

        let err = session.add_to_cart(product("1", 36000.0), 1).await.unwrap_err();
        assert!(matches!(err, SessionError::LoginRequired));
        assert!(matches!(
            session.set_quantity("1", 2).await.unwrap_err(),
            SessionError::LoginRequired
        ));
        assert!(matches!(
            session.checkout_link(Currency::Ars, &ExchangeRates::default()),
            Err(SessionError::LoginRequired)
        ));
        assert_eq!(session.item_count(), 0);
    }

    #[tokio::test]
    async fn double_add_merges_and_prices_in_usd() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _) = session_in(dir.path()).await;

        session
            .register("Ana", "user@example.com", "secret123")
            .await
            .unwrap();
        session.add_to_cart(product("1", 36000.0), 1).await.unwrap();
        session.add_to_cart(product("1", 36000.0), 1).await.unwrap();

        assert_eq!(session.cart().lines().len(), 1);
        assert_eq!(session.cart().lines()[0].quantity, 2);
        assert_eq!(session.total(), 72000.0);

        let link = session
            .checkout_link(Currency::Usd, &ExchangeRates::default())
            .unwrap();
        let text = link
            .query_pairs()
            .find(|(key, _)| key == "text")
            .map(|(_, value)| value.into_owned())
            .unwrap();
        assert!(text.contains("US$60"));
        assert!(text.contains("user@example.com"));
    }

    #[tokio::test]
    async fn logout_flushes_then_clears() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, remote_store) = session_in(dir.path()).await;

        session
            .register("Ana", "user@example.com", "secret123")
            .await
            .unwrap();
        session.add_to_cart(product("1", 36000.0), 2).await.unwrap();
        session.logout().await;

        assert_eq!(session.item_count(), 0);
        assert!(session.current_user().is_none());
        assert!(matches!(
            session.add_to_cart(product("2", 10.0), 1).await.unwrap_err(),
            SessionError::LoginRequired
        ));

        // The flush landed on the remote sink before the clear.
        let remote = LocalCartCache::new(remote_store);
        let flushed = remote.load("user@example.com").await.unwrap().unwrap();
        assert_eq!(flushed.items.len(), 1);
        assert_eq!(flushed.items[0].quantity, 2);
    }

    #[tokio::test]
    async fn login_restores_the_remote_cart() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, remote_store) = session_in(dir.path()).await;

        let saved = CartRecord {
            items: vec![crate::models::CartLine {
                product: product("7", 500.0),
                quantity: 3,
            }],
            saved_at: Utc::now(),
        };
        LocalCartCache::new(remote_store)
            .save("user@example.com", &saved)
            .await
            .unwrap();

        // The fake gateway only knows users it signed up.
        session
            .register("Ana", "user@example.com", "secret123")
            .await
            .unwrap();

        assert_eq!(session.item_count(), 3);
        assert_eq!(session.cart().lines()[0].product.id, "7");
    }

    #[tokio::test]
    async fn restore_resumes_the_cached_identity() {
        let dir = tempfile::tempdir().unwrap();

        {
            let (mut session, _) = session_in(dir.path()).await;
            session
                .register("Ana", "user@example.com", "secret123")
                .await
                .unwrap();
            session.add_to_cart(product("1", 100.0), 1).await.unwrap();
            // logout flushes synchronously, so the cache files are settled.
            session.logout().await;
        }

        // logout() forgets the identity, so seed one back the way a prior
        // process would have left it.
        let (mut session, _) = session_in(dir.path()).await;
        assert_eq!(session.restore().await.unwrap(), None);

        let stored = StoredSession {
            user: UserProfile {
                name: "Ana".to_string(),
                email: "user@example.com".to_string(),
                role: Role::Customer,
                registered_at: Utc::now(),
            },
            token: "Bearer fake-user@example.com".to_string(),
        };
        session.local.set(CURRENT_USER_KEY, &stored).await.unwrap();

        let resumed = session.restore().await.unwrap().unwrap();
        assert_eq!(resumed.email, "user@example.com");
        assert_eq!(session.item_count(), 1);
    }

    #[tokio::test]
    async fn empty_cart_cannot_check_out() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _) = session_in(dir.path()).await;

        session
            .register("Ana", "user@example.com", "secret123")
            .await
            .unwrap();
        assert!(matches!(
            session.checkout_link(Currency::Ars, &ExchangeRates::default()),
            Err(SessionError::EmptyCart)
        ));
    }

    #[tokio::test]
    async fn bad_credentials_surface_the_api_error() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _) = session_in(dir.path()).await;

        let err = session.login("ghost@example.com", "nope").await.unwrap_err();
        match err {
            SessionError::Api(api) => assert_eq!(api.status(), Some(401)),
            other => panic!("expected an api error, got {other:?}"),
        }
    }
}
