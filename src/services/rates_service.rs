use crate::audit::log_audit;
use crate::dto::rates::{RatesData, UpdateRatesRequest};
use crate::error::{AppError, AppResult};
use crate::kv::{self, keys};
use crate::middleware::auth::{AuthUser, ensure_admin};
use crate::models::ExchangeRates;
use crate::response::{ApiResponse, Meta};
use crate::state::AppState;

/// Current rate table, falling back to the built-in defaults when none has
/// been stored yet.
pub async fn get_rates(state: &AppState) -> AppResult<ApiResponse<RatesData>> {
    let rates: Option<ExchangeRates> =
        kv::get_as(state.kv.as_ref(), keys::EXCHANGE_RATES).await?;
    let rates = rates.unwrap_or_default();
    Ok(ApiResponse::success("Exchange rates", RatesData { rates }, None))
}

pub async fn update_rates(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateRatesRequest,
) -> AppResult<ApiResponse<RatesData>> {
    ensure_admin(user)?;

    let rates = payload.rates;
    rates
        .validate()
        .map_err(|err| AppError::Validation(err.to_string()))?;

    kv::set_as(state.kv.as_ref(), keys::EXCHANGE_RATES, &rates).await?;

    if let Err(err) = log_audit(
        state.kv.as_ref(),
        Some(&user.email),
        "rates_updated",
        Some(keys::EXCHANGE_RATES),
        serde_json::to_value(&rates).ok(),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Exchange rates updated",
        RatesData { rates },
        Some(Meta::empty()),
    ))
}
