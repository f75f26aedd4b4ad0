use std::collections::HashSet;

use chrono::Utc;

use crate::dto::cart::{CartData, SaveCartRequest, SavedCart};
use crate::error::{AppError, AppResult};
use crate::kv::{self, keys};
use crate::middleware::auth::AuthUser;
use crate::models::{CartLine, CartRecord};
use crate::response::ApiResponse;
use crate::state::AppState;

pub async fn get_cart(
    state: &AppState,
    user: &AuthUser,
    email: &str,
) -> AppResult<ApiResponse<CartData>> {
    let email = normalize_email(email);
    if !user.can_access_cart(&email) {
        return Err(AppError::Forbidden);
    }

    let cart: Option<CartRecord> = kv::get_as(state.kv.as_ref(), &keys::cart(&email)).await?;
    Ok(ApiResponse::success("Cart", CartData { cart }, None))
}

pub async fn save_cart(
    state: &AppState,
    user: &AuthUser,
    email: &str,
    payload: SaveCartRequest,
) -> AppResult<ApiResponse<SavedCart>> {
    let email = normalize_email(email);
    if !user.can_access_cart(&email) {
        return Err(AppError::Forbidden);
    }

    validate_lines(&payload.items)?;

    let saved_at = payload.saved_at.unwrap_or_else(Utc::now);
    let key = keys::cart(&email);

    if let Some(existing) = kv::get_as::<CartRecord>(state.kv.as_ref(), &key).await? {
        if existing.saved_at > saved_at {
            return Err(AppError::Conflict(
                "a newer cart snapshot is already saved".into(),
            ));
        }
    }

    let record = CartRecord {
        items: payload.items,
        saved_at,
    };
    kv::set_as(state.kv.as_ref(), &key, &record).await?;

    Ok(ApiResponse::success("Cart saved", SavedCart { saved_at }, None))
}

fn validate_lines(lines: &[CartLine]) -> AppResult<()> {
    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            return Err(AppError::Validation("quantity must be at least 1".into()));
        }
        if !line.product.price.is_finite() || line.product.price < 0.0 {
            return Err(AppError::Validation(
                "price must be a non-negative number".into(),
            ));
        }
        if !seen.insert(line.product.id.as_str()) {
            return Err(AppError::Validation(format!(
                "duplicate cart line for product {}",
                line.product.id
            )));
        }
    }
    Ok(())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
