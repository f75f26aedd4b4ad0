use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ExchangeRates;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RatesData {
    pub rates: ExchangeRates,
}

/// Full replacement of the rate table; partial updates are not supported.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateRatesRequest {
    pub rates: ExchangeRates,
}
