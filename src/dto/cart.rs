use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CartLine, CartRecord};

/// Cart fetch payload. `cart` is `null` when nothing has ever been saved for
/// the identity, so clients can tell "no remote record" from "saved empty".
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartData {
    pub cart: Option<CartRecord>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaveCartRequest {
    pub items: Vec<CartLine>,
    /// Snapshot time of the cart being saved. Older than the stored record
    /// means a stale writer; the server rejects it. Omitted means "stamp on
    /// arrival".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SavedCart {
    pub saved_at: DateTime<Utc>,
}
