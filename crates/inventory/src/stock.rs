//! Stock adjustment rules.

use chrono::{DateTime, Utc};

use stockroom_core::{DomainError, DomainResult};
use stockroom_products::Product;

/// Products strictly below this quantity are reported as low on stock.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Reason recorded when an adjustment does not carry one.
pub const DEFAULT_ADJUSTMENT_REASON: &str = "Ajuste de inventario";

/// Compute the stock after applying `delta`.
///
/// Fails with `InsufficientStock` when the result would be negative and with
/// `StockOverflow` when it does not fit in the quantity range.
pub fn checked_adjust(stock: i64, delta: i64) -> DomainResult<i64> {
    let candidate = stock
        .checked_add(delta)
        .ok_or(DomainError::StockOverflow { stock, delta })?;
    if candidate < 0 {
        return Err(DomainError::InsufficientStock { stock, delta });
    }
    Ok(candidate)
}

/// Apply a signed delta to a product's stock.
///
/// On failure the product is left untouched. A zero delta still counts as a
/// mutation and refreshes `updated_at`.
pub fn adjust_stock(product: &mut Product, delta: i64, now: DateTime<Utc>) -> DomainResult<i64> {
    let new_stock = checked_adjust(product.stock, delta)?;
    product.stock = new_stock;
    product.updated_at = now;
    Ok(new_stock)
}

/// Whether a product belongs in the low-stock report.
pub fn is_low_stock(product: &Product, threshold: i64) -> bool {
    product.active && product.stock < threshold
}

/// A requested stock adjustment: signed delta plus a free-text reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    pub delta: i64,
    pub reason: String,
}

impl StockAdjustment {
    /// Build an adjustment; a missing or blank reason falls back to the default.
    pub fn new(delta: i64, reason: Option<String>) -> Self {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ADJUSTMENT_REASON.to_string());
        Self { delta, reason }
    }

    /// Human-readable confirmation returned to the caller.
    pub fn message(&self) -> String {
        format!(
            "Stock actualizado: {} unidades. Motivo: {}",
            self.delta, self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use stockroom_core::{CategoryId, ProductId};
    use stockroom_products::{NewProduct, Price};

    fn product(stock: i64, active: bool) -> Product {
        Product::create(
            ProductId::new(1),
            NewProduct {
                name: "Cable".to_string(),
                description: String::new(),
                price: Price::new(Decimal::new(500, 2)).unwrap(),
                stock,
                category: CategoryId::new(1),
                active,
            },
            Utc::now(),
        )
    }

    #[test]
    fn restock_and_consume() {
        let mut p = product(20, true);
        assert_eq!(adjust_stock(&mut p, 5, Utc::now()).unwrap(), 25);
        assert_eq!(adjust_stock(&mut p, -25, Utc::now()).unwrap(), 0);
        assert_eq!(p.stock, 0);
    }

    #[test]
    fn insufficient_stock_leaves_product_unchanged() {
        let mut p = product(20, true);
        let before = p.clone();

        let err = adjust_stock(&mut p, -25, Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::InsufficientStock { stock: 20, delta: -25 });
        assert_eq!(p, before);

        // Retrying without change fails the same way.
        assert_eq!(adjust_stock(&mut p, -25, Utc::now()).unwrap_err(), err);
    }

    #[test]
    fn zero_delta_still_refreshes_updated_at() {
        let mut p = product(7, true);
        let later = p.updated_at + chrono::Duration::seconds(1);

        assert_eq!(adjust_stock(&mut p, 0, later).unwrap(), 7);
        assert_eq!(p.updated_at, later);
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(
            checked_adjust(i64::MAX, 1).unwrap_err(),
            DomainError::StockOverflow { stock: i64::MAX, delta: 1 }
        );
    }

    #[test]
    fn low_stock_excludes_threshold_and_inactive() {
        assert!(is_low_stock(&product(9, true), LOW_STOCK_THRESHOLD));
        assert!(!is_low_stock(&product(10, true), LOW_STOCK_THRESHOLD));
        assert!(!is_low_stock(&product(0, false), LOW_STOCK_THRESHOLD));
    }

    #[test]
    fn adjustment_message_embeds_delta_and_reason() {
        let adj = StockAdjustment::new(-5, None);
        assert_eq!(adj.reason, DEFAULT_ADJUSTMENT_REASON);
        assert_eq!(
            adj.message(),
            "Stock actualizado: -5 unidades. Motivo: Ajuste de inventario"
        );

        let adj = StockAdjustment::new(3, Some("  Devolución  ".to_string()));
        assert_eq!(adj.message(), "Stock actualizado: 3 unidades. Motivo: Devolución");
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

            /// Property: adjustment succeeds exactly when the result is non-negative,
            /// and the result is the exact sum.
            #[test]
            fn adjustment_is_exact_or_rejected(
                stock in 0i64..1_000_000,
                delta in -2_000_000i64..2_000_000
            ) {
                match checked_adjust(stock, delta) {
                    Ok(new_stock) => {
                        prop_assert!(stock + delta >= 0);
                        prop_assert_eq!(new_stock, stock + delta);
                    }
                    Err(e) => {
                        prop_assert!(stock + delta < 0);
                        prop_assert_eq!(e, DomainError::InsufficientStock { stock, delta });
                    }
                }
            }
        }
    }
}
