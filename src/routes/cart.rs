use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::dto::cart::{CartData, SaveCartRequest, SavedCart};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::services::cart_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{email}", get(get_cart))
        .route("/{email}", post(save_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart/{email}",
    params(
        ("email" = String, Path, description = "Cart owner email")
    ),
    responses(
        (status = 200, description = "Fetch the saved cart; `cart` is null when none exists", body = ApiResponse<CartData>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(email): Path<String>,
) -> AppResult<Json<ApiResponse<CartData>>> {
    let resp = cart_service::get_cart(&state, &user, &email).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/{email}",
    params(
        ("email" = String, Path, description = "Cart owner email")
    ),
    request_body = SaveCartRequest,
    responses(
        (status = 200, description = "Overwrite the saved cart", body = ApiResponse<SavedCart>),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "A newer snapshot is already saved")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn save_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(email): Path<String>,
    Json(payload): Json<SaveCartRequest>,
) -> AppResult<Json<ApiResponse<SavedCart>>> {
    let resp = cart_service::save_cart(&state, &user, &email, payload).await?;
    Ok(Json(resp))
}
