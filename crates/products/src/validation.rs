//! Field validation rules shared by categories and products.

use rust_decimal::Decimal;

use stockroom_core::{DomainError, DomainResult, FieldErrors};

/// Largest integer part a price may carry (NUMERIC(10, 2) in storage).
const PRICE_INTEGER_LIMIT: i64 = 100_000_000;
const PRICE_MAX_DECIMAL_PLACES: u32 = 2;

/// How an update treats fields that are absent from the input.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpdateMode {
    /// Full update: every required field must be supplied.
    Replace,
    /// Partial update: only supplied fields are validated and applied.
    Merge,
}

impl UpdateMode {
    pub(crate) fn requires_all(self) -> bool {
        self == UpdateMode::Replace
    }
}

/// Validate a display name: trimmed, non-blank, at most `max_len` characters.
pub fn validate_name(value: &str, max_len: usize) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name", "blank"));
    }
    if trimmed.chars().count() > max_len {
        return Err(DomainError::validation("name", "max_length"));
    }
    Ok(trimmed.to_string())
}

/// Validate a price; returns the value unchanged when it is acceptable.
pub fn validate_price(value: Decimal) -> DomainResult<Decimal> {
    if value <= Decimal::ZERO {
        return Err(DomainError::validation("price", "price_must_be_positive"));
    }
    if value.normalize().scale() > PRICE_MAX_DECIMAL_PLACES {
        return Err(DomainError::validation("price", "price_max_decimal_places"));
    }
    if value.trunc() >= Decimal::from(PRICE_INTEGER_LIMIT) {
        return Err(DomainError::validation("price", "price_max_digits"));
    }
    Ok(value)
}

/// Validate a stock quantity; returns the value unchanged when it is acceptable.
pub fn validate_stock(value: i64) -> DomainResult<i64> {
    if value < 0 {
        return Err(DomainError::validation("stock", "stock_must_be_nonnegative"));
    }
    Ok(value)
}

/// Run `validate` on an optional input, recording failures under `field`.
///
/// A missing value is an error only when `required` is set.
pub(crate) fn check<T, U>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<T>,
    required: bool,
    validate: impl FnOnce(T) -> DomainResult<U>,
) -> Option<U> {
    match value {
        None => {
            if required {
                errors.push(field, "required");
            }
            None
        }
        Some(v) => match validate(v) {
            Ok(u) => Some(u),
            Err(e) => {
                errors.absorb(field, e);
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(err: DomainError, field: &str) -> Vec<String> {
        match err {
            DomainError::Validation(errors) => errors.get(field).unwrap_or_default().to_vec(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn name_is_trimmed() {
        assert_eq!(validate_name("  Cable  ", 10).unwrap(), "Cable");
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(codes(validate_name("   ", 10).unwrap_err(), "name"), ["blank"]);
    }

    #[test]
    fn long_name_is_rejected() {
        let name = "x".repeat(11);
        assert_eq!(codes(validate_name(&name, 10).unwrap_err(), "name"), ["max_length"]);
    }

    #[test]
    fn zero_price_is_rejected() {
        assert_eq!(
            codes(validate_price(Decimal::ZERO).unwrap_err(), "price"),
            ["price_must_be_positive"]
        );
    }

    #[test]
    fn price_with_three_decimals_is_rejected() {
        let value: Decimal = "1.005".parse().unwrap();
        assert_eq!(
            codes(validate_price(value).unwrap_err(), "price"),
            ["price_max_decimal_places"]
        );
    }

    #[test]
    fn trailing_zero_decimals_are_accepted() {
        let value: Decimal = "1.5000".parse().unwrap();
        assert_eq!(validate_price(value).unwrap(), value);
    }

    #[test]
    fn oversized_price_is_rejected() {
        let value = Decimal::from(PRICE_INTEGER_LIMIT);
        assert_eq!(codes(validate_price(value).unwrap_err(), "price"), ["price_max_digits"]);
    }

    #[test]
    fn check_reports_missing_required_only() {
        let mut errors = FieldErrors::new();
        assert_eq!(check(&mut errors, "a", None::<i64>, false, validate_stock), None);
        assert!(errors.is_empty());

        assert_eq!(check(&mut errors, "a", None::<i64>, true, validate_stock), None);
        assert_eq!(errors.get("a").unwrap(), ["required"]);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: every non-positive price is rejected as non-positive.
            #[test]
            fn non_positive_prices_are_rejected(cents in i64::MIN / 2..=0i64) {
                let err = validate_price(Decimal::new(cents, 2)).unwrap_err();
                prop_assert_eq!(codes(err, "price"), vec!["price_must_be_positive".to_string()]);
            }

            /// Property: positive prices within storage bounds are accepted unchanged.
            #[test]
            fn positive_prices_are_accepted(cents in 1i64..PRICE_INTEGER_LIMIT * 100) {
                let value = Decimal::new(cents, 2);
                prop_assert_eq!(validate_price(value).unwrap(), value);
            }

            /// Property: stock is valid exactly when it is non-negative.
            #[test]
            fn stock_is_valid_iff_non_negative(stock in any::<i64>()) {
                prop_assert_eq!(validate_stock(stock).is_ok(), stock >= 0);
            }
        }
    }
}
