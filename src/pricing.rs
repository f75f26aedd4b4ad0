use thiserror::Error;

use crate::models::{Currency, ExchangeRates};

#[derive(Debug, Error, PartialEq)]
pub enum PriceError {
    #[error("no usable exchange rate for {}", currency.code())]
    InvalidRate { currency: Currency },
}

/// Convert a base-currency amount into `currency` and round to the nearest
/// whole unit. The rate table holds base units per target unit, so conversion
/// is a division; the base currency passes through untouched.
pub fn convert(amount: f64, currency: Currency, rates: &ExchangeRates) -> Result<i64, PriceError> {
    let converted = if currency == Currency::BASE {
        amount
    } else {
        let factor = rates
            .factor(currency)
            .ok_or(PriceError::InvalidRate { currency })?;
        if !factor.is_finite() || factor <= 0.0 {
            return Err(PriceError::InvalidRate { currency });
        }
        amount / factor
    };

    Ok(converted.round() as i64)
}

/// Render an amount for display: convert, prefix the currency symbol and
/// group thousands with commas. `36000` with a 1200 USD rate comes out as
/// `US$30`.
pub fn format_price(
    amount: f64,
    currency: Currency,
    rates: &ExchangeRates,
) -> Result<String, PriceError> {
    let converted = convert(amount, currency, rates)?;
    Ok(format!("{}{}", currency.symbol(), group_thousands(converted)))
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rates() -> ExchangeRates {
        ExchangeRates::default()
    }

    fn table(value: serde_json::Value) -> ExchangeRates {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn base_currency_is_unconverted() {
        assert_eq!(format_price(36000.0, Currency::Ars, &rates()).unwrap(), "$36,000");
    }

    #[test]
    fn usd_divides_by_rate() {
        assert_eq!(format_price(36000.0, Currency::Usd, &rates()).unwrap(), "US$30");
        assert_eq!(format_price(72000.0, Currency::Usd, &rates()).unwrap(), "US$60");
    }

    #[test]
    fn conversion_rounds_to_nearest_unit() {
        // 37000 / 1200 = 30.83..
        assert_eq!(format_price(37000.0, Currency::Usd, &rates()).unwrap(), "US$31");
        // 36500 / 1200 = 30.41..
        assert_eq!(format_price(36500.0, Currency::Usd, &rates()).unwrap(), "US$30");
    }

    #[test]
    fn guarani_uses_its_symbol_and_grouping() {
        // 36000 / 0.00015 = 240,000,000
        assert_eq!(
            format_price(36000.0, Currency::Pyg, &rates()).unwrap(),
            "₲240,000,000"
        );
    }

    #[test]
    fn missing_rate_is_an_error() {
        let table = table(json!({ "ARS": 1.0 }));
        assert_eq!(
            format_price(36000.0, Currency::Usd, &table),
            Err(PriceError::InvalidRate {
                currency: Currency::Usd
            })
        );
    }

    #[test]
    fn zero_or_negative_rate_is_an_error() {
        let mut table = ExchangeRates::default();
        table.set(Currency::Usd, 0.0);
        assert!(format_price(100.0, Currency::Usd, &table).is_err());
        table.set(Currency::Usd, -3.0);
        assert!(format_price(100.0, Currency::Usd, &table).is_err());
    }

    #[test]
    fn base_ignores_a_broken_table() {
        let empty = table(json!({}));
        assert_eq!(format_price(500.0, Currency::Ars, &empty).unwrap(), "$500");
    }

    #[test]
    fn grouping_handles_boundaries() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(-36000), "-36,000");
    }
}
