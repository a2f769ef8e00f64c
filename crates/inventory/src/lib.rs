//! Inventory domain module: stock adjustments and low-stock policy.
//!
//! This crate contains business rules for stock quantities, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage).

pub mod stock;

pub use stock::{
    adjust_stock, checked_adjust, is_low_stock, StockAdjustment, DEFAULT_ADJUSTMENT_REASON,
    LOW_STOCK_THRESHOLD,
};
