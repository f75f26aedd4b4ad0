use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;

use crate::audit::log_audit;
use crate::dto::auth::{AuthData, Claims, SigninRequest, SignupRequest};
use crate::error::{AppError, AppResult};
use crate::kv::{self, keys};
use crate::models::{Role, UserRecord};
use crate::response::{ApiResponse, Meta};
use crate::state::AppState;

pub async fn register_user(
    state: &AppState,
    payload: SignupRequest,
) -> AppResult<ApiResponse<AuthData>> {
    let SignupRequest {
        name,
        email,
        password,
    } = payload;
    let name = name.trim().to_string();
    let email = normalize_email(&email);

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "name, email and password are required".into(),
        ));
    }
    if !email.contains('@') {
        return Err(AppError::Validation("email is not valid".into()));
    }

    let key = keys::user(&email);
    if state.kv.get(&key).await?.is_some() {
        return Err(AppError::Validation("Email is already taken".into()));
    }

    let password_hash = hash_password(&password)?;

    // The admin role is provisioned through configuration, never requested
    // by the caller.
    let role = if state.config.is_admin_email(&email) {
        Role::Admin
    } else {
        Role::Customer
    };

    let record = UserRecord {
        name,
        email: email.clone(),
        role,
        registered_at: Utc::now(),
        password_hash,
    };
    kv::set_as(state.kv.as_ref(), &key, &record).await?;

    let token = issue_token(&state.config.jwt_secret, &email, role)?;

    if let Err(err) = log_audit(
        state.kv.as_ref(),
        Some(&email),
        "user_signup",
        Some(&key),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "User created",
        AuthData {
            user: record.profile(),
            token,
        },
        None,
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: SigninRequest,
) -> AppResult<ApiResponse<AuthData>> {
    let SigninRequest { email, password } = payload;
    let email = normalize_email(&email);

    let record: Option<UserRecord> = kv::get_as(state.kv.as_ref(), &keys::user(&email)).await?;
    let record = match record {
        Some(record) => record,
        None => return Err(AppError::Unauthorized("Invalid email or password".into())),
    };

    let parsed_hash = PasswordHash::new(&record.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let token = issue_token(&state.config.jwt_secret, &record.email, record.role)?;

    if let Err(err) = log_audit(
        state.kv.as_ref(),
        Some(&email),
        "user_signin",
        Some(&keys::user(&email)),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Logged in",
        AuthData {
            user: record.profile(),
            token,
        },
        Some(Meta::empty()),
    ))
}

/// Sign a 24 hour session token carrying the email and role claims.
pub fn issue_token(secret: &str, email: &str, role: Role) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: email.to_string(),
        role,
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(format!("Bearer {token}"))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Hash a password the same way signup does. Shared with the seed binary.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}
