use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::dto::auth::Claims;
use crate::error::AppError;
use crate::models::Role;
use crate::state::AppState;

/// Verified identity carried by a request. Built from the `Authorization`
/// bearer token; the role comes from the signed claims, never from the
/// request body.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Whether this session may read or write the cart stored under `email`.
    /// Admins can, owners can, nobody else.
    pub fn can_access_cart(&self, email: &str) -> bool {
        self.role.is_admin() || self.email == email
    }
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.role.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let Some(token) = auth_str.strip_prefix("Bearer ") else {
            return Err(AppError::Unauthorized("Invalid Authorization scheme".into()));
        };

        let decoded = decode::<Claims>(
            token.trim(),
            &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        Ok(AuthUser {
            email: decoded.claims.sub,
            role: decoded.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};

    use crate::config::AppConfig;
    use crate::kv::MemoryKv;

    use super::*;

    const SECRET: &str = "test-secret";

    fn state() -> AppState {
        AppState::new(
            Arc::new(MemoryKv::new()),
            AppConfig {
                database_url: None,
                host: "127.0.0.1".to_string(),
                port: 0,
                jwt_secret: SECRET.to_string(),
                admin_emails: vec![],
            },
        )
    }

    fn token(email: &str, role: Role) -> String {
        let claims = Claims {
            sub: email.to_string(),
            role,
            exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    async fn extract(header_value: Option<String>) -> Result<AuthUser, AppError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = builder.body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        AuthUser::from_request_parts(&mut parts, &state()).await
    }

    #[tokio::test]
    async fn valid_bearer_token_yields_the_claims() {
        let user = extract(Some(format!("Bearer {}", token("ana@example.com", Role::Customer))))
            .await
            .unwrap();

        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.role, Role::Customer);
        assert!(user.can_access_cart("ana@example.com"));
        assert!(!user.can_access_cart("someone-else@example.com"));
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        assert!(matches!(
            extract(None).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        assert!(matches!(
            extract(Some("Bearer not-a-jwt".to_string())).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn admin_check_follows_the_role_claim() {
        let admin = extract(Some(format!("Bearer {}", token("admin@example.com", Role::Admin))))
            .await
            .unwrap();
        let customer = extract(Some(format!("Bearer {}", token("ana@example.com", Role::Customer))))
            .await
            .unwrap();

        assert!(ensure_admin(&admin).is_ok());
        assert!(matches!(ensure_admin(&customer), Err(AppError::Forbidden)));
        assert!(admin.can_access_cart("ana@example.com"));
    }
}
