//! Catalog persistence: the repository contract and its backends.

pub mod filter;
pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use filter::ProductFilter;
pub use in_memory::InMemoryCatalogStore;
pub use postgres::PostgresCatalogStore;
pub use r#trait::{CatalogStore, Constraint, StoreError, StoreResult};
