//! Price value object.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, ValueObject};

use crate::validation::validate_price;

/// A validated, strictly positive price with two decimal places.
///
/// Serialized as a decimal string (`"5.00"`); deserialization runs the same
/// validation as [`Price::new`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub fn new(amount: Decimal) -> DomainResult<Self> {
        let mut amount = validate_price(amount)?;
        amount.rescale(2);
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl ValueObject for Price {}

impl TryFrom<Decimal> for Price {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Price::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_is_normalized_to_two_decimals() {
        let price = Price::new(Decimal::from(5)).unwrap();
        assert_eq!(price.to_string(), "5.00");
        assert_eq!(serde_json::to_value(price).unwrap(), serde_json::json!("5.00"));
    }

    #[test]
    fn price_deserializes_from_number_or_string() {
        let from_number: Price = serde_json::from_value(serde_json::json!(5.5)).unwrap();
        let from_string: Price = serde_json::from_value(serde_json::json!("5.50")).unwrap();
        assert_eq!(from_number, from_string);
    }

    #[test]
    fn negative_price_fails_to_deserialize() {
        let res: Result<Price, _> = serde_json::from_value(serde_json::json!(-1));
        assert!(res.is_err());
    }
}
