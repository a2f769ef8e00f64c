//! Product listing filters.

use rust_decimal::Decimal;

use stockroom_core::CategoryId;
use stockroom_products::Product;

/// Conjunctive product filter; `None` means no constraint on that field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    pub category: Option<CategoryId>,
    /// Inclusive lower price bound.
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound.
    pub max_price: Option<Decimal>,
    /// Exclusive upper stock bound.
    pub stock_below: Option<i64>,
    pub active: Option<bool>,
}

impl ProductFilter {
    /// Active products with stock strictly below `threshold`.
    pub fn low_stock(threshold: i64) -> Self {
        Self {
            stock_below: Some(threshold),
            active: Some(true),
            ..Self::default()
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(needle) = &self.name_contains {
            if !product.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(category) = self.category {
            if product.category != category {
                return false;
            }
        }
        let price = product.price.amount();
        if self.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| price > max) {
            return false;
        }
        if self.stock_below.is_some_and(|limit| product.stock >= limit) {
            return false;
        }
        if self.active.is_some_and(|active| product.active != active) {
            return false;
        }
        true
    }
}
