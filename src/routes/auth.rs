use axum::{Json, Router, extract::State, routing::post};

use crate::dto::auth::{AuthData, SigninRequest, SignupRequest};
use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::services::auth_service::{login_user, register_user};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Create an account", body = ApiResponse<AuthData>),
        (status = 400, description = "Validation failed")
    ),
    tag = "Auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<Json<ApiResponse<AuthData>>> {
    let resp = register_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Sign in", body = ApiResponse<AuthData>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<SigninRequest>,
) -> AppResult<Json<ApiResponse<AuthData>>> {
    let resp = login_user(&state, payload).await?;
    Ok(Json(resp))
}
