use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::dto::rates::{RatesData, UpdateRatesRequest};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::services::rates_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_rates))
        .route("/", post(update_rates))
}

#[utoipa::path(
    get,
    path = "/api/exchange-rates",
    responses(
        (status = 200, description = "Current rate table", body = ApiResponse<RatesData>)
    ),
    tag = "Rates"
)]
pub async fn get_rates(State(state): State<AppState>) -> AppResult<Json<ApiResponse<RatesData>>> {
    let resp = rates_service::get_rates(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/exchange-rates",
    request_body = UpdateRatesRequest,
    responses(
        (status = 200, description = "Replace the rate table (admin only)", body = ApiResponse<RatesData>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Rates"
)]
pub async fn update_rates(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateRatesRequest>,
) -> AppResult<Json<ApiResponse<RatesData>>> {
    let resp = rates_service::update_rates(&state, &user, payload).await?;
    Ok(Json(resp))
}
