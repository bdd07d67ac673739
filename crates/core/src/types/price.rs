//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A plan price with currency information.
///
/// Amounts serialize as strings (`"499.00"`) so they survive JSON content
/// files and browsers without float rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    #[serde(default)]
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price from an integer number of minor units (cents).
    #[must_use]
    pub fn from_cents(cents: i64, currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::new(cents, 2),
            currency_code,
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:.2}",
            self.currency_code.symbol(),
            self.amount.round_dp(2)
        )
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    INR,
    TRY,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::INR => "₹",
            Self::TRY => "₺",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_from_cents() {
        let price = Price::from_cents(49_900, CurrencyCode::USD);
        assert_eq!(price.amount, Decimal::from_str("499.00").unwrap());
    }

    #[test]
    fn test_display() {
        let price = Price::new(Decimal::from_str("1299.5").unwrap(), CurrencyCode::EUR);
        assert_eq!(price.to_string(), "€1299.50");
    }

    #[test]
    fn test_serde_amount_as_string() {
        let price = Price::from_cents(1999, CurrencyCode::GBP);
        let json = serde_json::to_value(price).unwrap();
        assert_eq!(json["amount"], "19.99");
        assert_eq!(json["currency_code"], "GBP");
    }

    #[test]
    fn test_deserialize_defaults_currency() {
        let price: Price = serde_json::from_str(r#"{"amount":"10.00"}"#).unwrap();
        assert_eq!(price.currency_code, CurrencyCode::USD);
    }
}
