use async_trait::async_trait;
use thiserror::Error;

use stockroom_core::{CategoryId, DomainError, ProductId};
use stockroom_products::{Category, CategoryPatch, NewCategory, NewProduct, Product, ProductPatch};

use super::filter::ProductFilter;

pub type StoreResult<T> = Result<T, StoreError>;

/// Referential constraints the store enforces.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// A product referenced a category that does not exist.
    UnknownCategory,
    /// A category cannot be deleted while products reference it.
    CategoryInUse,
}

impl Constraint {
    pub fn code(self) -> &'static str {
        match self {
            Constraint::UnknownCategory => "category_not_found",
            Constraint::CategoryInUse => "category_in_use",
        }
    }

    /// Domain field the violation is attributed to, if any.
    pub fn field(self) -> Option<&'static str> {
        match self {
            Constraint::UnknownCategory => Some("category"),
            Constraint::CategoryInUse => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("constraint violated: {}", .0.code())]
    Constraint(Constraint),

    /// A domain rule rejected the operation (e.g. insufficient stock).
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Repository contract for the catalog.
///
/// Every mutation of categories and products goes through this trait.
/// Implementations must make [`CatalogStore::adjust_stock`] atomic per
/// product, and must not insert or re-point a product at a category that
/// does not exist at that moment.
///
/// Listings are returned in insertion order.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create_category(&self, new: NewCategory) -> StoreResult<Category>;

    async fn get_category(&self, id: CategoryId) -> StoreResult<Category>;

    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    async fn update_category(&self, id: CategoryId, patch: CategoryPatch) -> StoreResult<Category>;

    /// Permanently remove a category. Fails with
    /// [`Constraint::CategoryInUse`] while any product references it.
    async fn delete_category(&self, id: CategoryId) -> StoreResult<()>;

    /// Number of products referencing `id`, evaluated at call time.
    async fn count_products(&self, id: CategoryId) -> StoreResult<i64>;

    async fn create_product(&self, new: NewProduct) -> StoreResult<Product>;

    async fn get_product(&self, id: ProductId) -> StoreResult<Product>;

    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>>;

    /// Apply a validated patch and refresh `updated_at`.
    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product>;

    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;

    /// Atomically apply a signed stock delta; returns the updated product.
    ///
    /// Fails with `DomainError::InsufficientStock` (stock unchanged) when the
    /// result would be negative.
    async fn adjust_stock(&self, id: ProductId, delta: i64) -> StoreResult<Product>;
}
