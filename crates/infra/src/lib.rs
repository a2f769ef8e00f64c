//! Infrastructure layer: persistence backends and configuration.

pub mod config;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use store::{
    CatalogStore, Constraint, InMemoryCatalogStore, PostgresCatalogStore, ProductFilter,
    StoreError, StoreResult,
};
