//! HTTP client for the storefront API. Used by the headless session and by
//! operational tooling; talks the same envelope the server emits.

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

use crate::dto::auth::{AuthData, SigninRequest, SignupRequest};
use crate::dto::cart::{CartData, SaveCartRequest, SavedCart};
use crate::dto::products::{CreateProductRequest, ProductList, UpdateProductRequest};
use crate::dto::rates::{RatesData, UpdateRatesRequest};
use crate::models::{CartRecord, ExchangeRates, Product};
use crate::response::ApiResponse;
use crate::routes::health::HealthData;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server replied {status}: {message}")]
    Api { status: u16, message: String },

    #[error("response body had no data")]
    MissingData,

    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Status code of a server-side rejection, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Client for one storefront backend. Cheap to clone; the session token is
/// shared across clones, so signing in anywhere signs in everywhere.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    /// `Bearer `-prefixed token, exactly as the server issued it.
    token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                http: reqwest::Client::new(),
                base_url,
                token: RwLock::new(None),
            }),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Current session token, if signed in.
    pub async fn token(&self) -> Option<String> {
        self.inner.token.read().await.clone()
    }

    /// Install a previously issued token, e.g. one restored from disk.
    pub async fn adopt_token(&self, token: String) {
        *self.inner.token.write().await = Some(token);
    }

    /// Drop the session token. Purely client-side; the token itself just
    /// expires server-side.
    pub async fn sign_out(&self) {
        *self.inner.token.write().await = None;
    }

    pub async fn health(&self) -> Result<HealthData, ApiError> {
        let url = self.endpoint("/health")?;
        self.send(self.inner.http.get(url)).await
    }

    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthData, ApiError> {
        let payload = SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let url = self.endpoint("/api/auth/signup")?;
        let auth: AuthData = self.send(self.inner.http.post(url).json(&payload)).await?;
        self.adopt_token(auth.token.clone()).await;
        Ok(auth)
    }

    pub async fn signin(&self, email: &str, password: &str) -> Result<AuthData, ApiError> {
        let payload = SigninRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let url = self.endpoint("/api/auth/signin")?;
        let auth: AuthData = self.send(self.inner.http.post(url).json(&payload)).await?;
        self.adopt_token(auth.token.clone()).await;
        Ok(auth)
    }

    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        let url = self.endpoint("/api/products")?;
        let list: ProductList = self.send(self.inner.http.get(url)).await?;
        Ok(list.products)
    }

    pub async fn product(&self, id: &str) -> Result<Product, ApiError> {
        let url = self.endpoint(&format!("/api/products/{id}"))?;
        self.send(self.inner.http.get(url)).await
    }

    pub async fn create_product(&self, payload: &CreateProductRequest) -> Result<Product, ApiError> {
        let url = self.endpoint("/api/products")?;
        self.send(self.inner.http.post(url).json(payload)).await
    }

    pub async fn update_product(
        &self,
        id: &str,
        payload: &UpdateProductRequest,
    ) -> Result<Product, ApiError> {
        let url = self.endpoint(&format!("/api/products/{id}"))?;
        self.send(self.inner.http.put(url).json(payload)).await
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/api/products/{id}"))?;
        let _: serde_json::Value = self.send(self.inner.http.delete(url)).await?;
        Ok(())
    }

    /// Saved cart for `email`, or `None` when the server has no record.
    pub async fn cart(&self, email: &str) -> Result<Option<CartRecord>, ApiError> {
        let url = self.endpoint(&format!("/api/cart/{email}"))?;
        let data: CartData = self.send(self.inner.http.get(url)).await?;
        Ok(data.cart)
    }

    pub async fn save_cart(&self, email: &str, record: &CartRecord) -> Result<SavedCart, ApiError> {
        let payload = SaveCartRequest {
            items: record.items.clone(),
            saved_at: Some(record.saved_at),
        };
        let url = self.endpoint(&format!("/api/cart/{email}"))?;
        self.send(self.inner.http.post(url).json(&payload)).await
    }

    pub async fn exchange_rates(&self) -> Result<ExchangeRates, ApiError> {
        let url = self.endpoint("/api/exchange-rates")?;
        let data: RatesData = self.send(self.inner.http.get(url)).await?;
        Ok(data.rates)
    }

    pub async fn update_exchange_rates(
        &self,
        rates: &ExchangeRates,
    ) -> Result<ExchangeRates, ApiError> {
        let payload = UpdateRatesRequest {
            rates: rates.clone(),
        };
        let url = self.endpoint("/api/exchange-rates")?;
        let data: RatesData = self.send(self.inner.http.post(url).json(&payload)).await?;
        Ok(data.rates)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let request = match self.inner.token.read().await.as_deref() {
            Some(token) => request.header(header::AUTHORIZATION, token),
            None => request,
        };
        let response = request.send().await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            let envelope: ApiResponse<T> = response.json().await?;
            envelope.data.ok_or(ApiError::MissingData)
        } else {
            // Error bodies carry the same envelope; fall back to the status
            // line when the body is not parseable.
            let message = response
                .json::<ApiResponse<serde_json::Value>>()
                .await
                .map(|envelope| envelope.message)
                .unwrap_or_else(|_| status.to_string());
            Err(ApiError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
