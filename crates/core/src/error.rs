//! Domain error model.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// One or more fields failed validation.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// A stock adjustment would drive the quantity below zero.
    #[error("insufficient stock (stock: {stock}, delta: {delta})")]
    InsufficientStock { stock: i64, delta: i64 },

    /// A stock adjustment overflowed the quantity range.
    #[error("stock overflow (stock: {stock}, delta: {delta})")]
    StockOverflow { stock: i64, delta: i64 },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    /// Single-field validation failure.
    pub fn validation(field: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, code))
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Stable machine-readable code, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
            DomainError::StockOverflow { .. } => "stock_overflow",
            DomainError::InvalidId(_) => "invalid_id",
        }
    }
}

/// Field-level validation failures, keyed by field name.
///
/// Each field maps to the list of error codes raised against it. Keys are
/// ordered so serialized output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, code: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, code);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, code: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(code.into());
    }

    /// Fold a domain error into this set.
    ///
    /// Validation errors are merged field by field; any other error is
    /// recorded under `field` by its code.
    pub fn absorb(&mut self, field: &str, err: DomainError) {
        match err {
            DomainError::Validation(other) => {
                for (f, codes) in other.0 {
                    self.0.entry(f).or_default().extend(codes);
                }
            }
            other => self.push(field, other.code()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Merge `other` into this set. Fields present in `other` replace any
    /// codes already recorded for them.
    pub fn overlay(&mut self, other: FieldErrors) {
        for (field, codes) in other.0 {
            self.0.insert(field, codes);
        }
    }

    /// Re-key every field (e.g. domain names to wire names).
    pub fn rename_fields(self, rename: impl Fn(&str) -> String) -> Self {
        let mut renamed = Self::new();
        for (field, codes) in self.0 {
            renamed.0.entry(rename(&field)).or_default().extend(codes);
        }
        renamed
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> DomainResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, codes) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{field}: {}", codes.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_errors_are_ok() {
        assert_eq!(FieldErrors::new().into_result(), Ok(()));
    }

    #[test]
    fn field_errors_aggregate_per_field() {
        let mut errors = FieldErrors::new();
        errors.push("price", "price_must_be_positive");
        errors.push("name", "required");
        errors.push("price", "price_max_decimal_places");

        assert_eq!(
            errors.get("price").unwrap(),
            ["price_must_be_positive", "price_max_decimal_places"]
        );
        assert_eq!(
            errors.to_string(),
            "name: required; price: price_must_be_positive, price_max_decimal_places"
        );
    }

    #[test]
    fn absorb_merges_validation_and_records_other_codes() {
        let mut errors = FieldErrors::new();
        errors.absorb("stock", DomainError::validation("stock", "stock_must_be_nonnegative"));
        errors.absorb("stock", DomainError::StockOverflow { stock: 1, delta: 2 });

        assert_eq!(
            errors.get("stock").unwrap(),
            ["stock_must_be_nonnegative", "stock_overflow"]
        );
    }

    #[test]
    fn overlay_replaces_codes_of_overlapping_fields() {
        let mut errors = FieldErrors::new();
        errors.push("price", "required");
        errors.push("stock", "stock_must_be_nonnegative");

        errors.overlay(FieldErrors::single("price", "invalid"));

        assert_eq!(errors.get("price").unwrap(), ["invalid"]);
        assert_eq!(errors.get("stock").unwrap(), ["stock_must_be_nonnegative"]);
    }

    #[test]
    fn field_errors_serialize_as_plain_map() {
        let errors = FieldErrors::single("name", "blank")
            .rename_fields(|f| if f == "name" { "nombre".into() } else { f.into() });
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "nombre": ["blank"] }));
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            DomainError::InsufficientStock { stock: 1, delta: -2 }.code(),
            "insufficient_stock"
        );
        assert_eq!(DomainError::invalid_id("x").code(), "invalid_id");
    }
}
