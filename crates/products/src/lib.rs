//! Catalog domain module: categories and products.
//!
//! This crate contains the business rules for the catalog, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage).

pub mod category;
pub mod price;
pub mod product;
pub mod validation;

pub use category::{Category, CategoryDraft, CategoryPatch, NewCategory, CATEGORY_NAME_MAX_LEN};
pub use price::Price;
pub use product::{NewProduct, Product, ProductDraft, ProductPatch, PRODUCT_NAME_MAX_LEN};
pub use validation::{validate_name, validate_price, validate_stock, UpdateMode};
