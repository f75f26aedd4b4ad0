use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Category {
    #[serde(rename = "Zapatillas")]
    Zapatillas,
    #[serde(rename = "Cremas Skala")]
    CremasSkala,
    #[serde(rename = "Perfumes árabes")]
    PerfumesArabes,
    #[serde(rename = "Pasta dental")]
    PastaDental,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Ars,
    Usd,
    Pyg,
}

impl Currency {
    pub const BASE: Currency = Currency::Ars;

    pub const ALL: [Currency; 3] = [Currency::Ars, Currency::Usd, Currency::Pyg];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Ars => "ARS",
            Currency::Usd => "USD",
            Currency::Pyg => "PYG",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Ars => "$",
            Currency::Usd => "US$",
            Currency::Pyg => "₲",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error)]
pub enum RatesError {
    #[error("rate table is missing {0}")]
    Missing(Currency),
    #[error("rate for {0} must be a positive number")]
    NonPositive(Currency),
    #[error("rate for the base currency {0} must be exactly 1")]
    BaseNotUnit(Currency),
}

/// Conversion factors relative to the base currency: a factor is how many
/// base-currency units one unit of the target currency is worth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = BTreeMap<String, f64>)]
pub struct ExchangeRates(BTreeMap<Currency, f64>);

impl Default for ExchangeRates {
    fn default() -> Self {
        ExchangeRates(BTreeMap::from([
            (Currency::Ars, 1.0),
            (Currency::Usd, 1200.0),
            (Currency::Pyg, 0.00015),
        ]))
    }
}

impl ExchangeRates {
    pub fn factor(&self, currency: Currency) -> Option<f64> {
        self.0.get(&currency).copied()
    }

    pub fn set(&mut self, currency: Currency, factor: f64) {
        self.0.insert(currency, factor);
    }

    pub fn validate(&self) -> Result<(), RatesError> {
        for currency in Currency::ALL {
            let factor = self.factor(currency).ok_or(RatesError::Missing(currency))?;
            if !factor.is_finite() || factor <= 0.0 {
                return Err(RatesError::NonPositive(currency));
            }
        }
        if self.factor(Currency::BASE) != Some(1.0) {
            return Err(RatesError::BaseNotUnit(Currency::BASE));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub registered_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Stored form of a user, at `user:<email>`. [`UserProfile`] is the public
/// view; the password hash stays server side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub registered_at: DateTime<Utc>,
    pub password_hash: String,
}

impl UserRecord {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            registered_at: self.registered_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub image: String,
    /// Unit price in the base currency.
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

/// The persisted cart envelope. `saved_at` orders concurrent writers: the
/// server refuses to overwrite a record with an older snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartRecord {
    pub items: Vec<CartLine>,
    pub saved_at: DateTime<Utc>,
}

impl CartRecord {
    /// An empty record, timestamped at the epoch so any real save supersedes it.
    pub fn empty() -> Self {
        CartRecord {
            items: Vec::new(),
            saved_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_display_names() {
        let json = serde_json::to_string(&Category::PerfumesArabes).unwrap();
        assert_eq!(json, "\"Perfumes árabes\"");
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Category::PerfumesArabes);
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(serde_json::from_str::<Category>("\"Electrónica\"").is_err());
    }

    #[test]
    fn rates_serialize_as_flat_code_map() {
        let rates = ExchangeRates::default();
        let value = serde_json::to_value(&rates).unwrap();
        assert_eq!(value["USD"], serde_json::json!(1200.0));
        assert_eq!(value["ARS"], serde_json::json!(1.0));
    }

    #[test]
    fn rates_schema_is_a_plain_code_map() {
        use utoipa::PartialSchema;

        let schema = serde_json::to_value(ExchangeRates::schema()).unwrap();
        assert_eq!(schema["type"], "object");
        assert!(schema["additionalProperties"].is_object());
    }

    #[test]
    fn default_rates_validate() {
        assert!(ExchangeRates::default().validate().is_ok());
    }

    #[test]
    fn rates_reject_non_positive_factor() {
        let mut rates = ExchangeRates::default();
        rates.set(Currency::Usd, 0.0);
        assert!(matches!(
            rates.validate(),
            Err(RatesError::NonPositive(Currency::Usd))
        ));
    }

    #[test]
    fn rates_reject_unpinned_base() {
        let mut rates = ExchangeRates::default();
        rates.set(Currency::Ars, 2.0);
        assert!(matches!(
            rates.validate(),
            Err(RatesError::BaseNotUnit(Currency::Ars))
        ));
    }

    #[test]
    fn cart_line_flattens_product_fields() {
        let line = CartLine {
            product: Product {
                id: "1".into(),
                name: "Zapatilla Urbana".into(),
                category: Category::Zapatillas,
                image: "https://example.com/z.png".into(),
                price: 36000.0,
                box_price: None,
                sizes: Some("36-44".into()),
                stock: Some(12),
            },
            quantity: 2,
        };
        let value = serde_json::to_value(&line).unwrap();
        assert_eq!(value["id"], "1");
        assert_eq!(value["quantity"], 2);
        assert!(value.get("product").is_none());
    }
}
