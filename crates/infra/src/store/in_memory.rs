use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use stockroom_core::{CategoryId, ProductId};
use stockroom_products::{Category, CategoryPatch, NewCategory, NewProduct, Product, ProductPatch};

use super::filter::ProductFilter;
use super::r#trait::{CatalogStore, Constraint, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    last_category_id: i64,
    last_product_id: i64,
    // Ids are allocated monotonically, so key order is insertion order.
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
}

impl Tables {
    fn ensure_category(&self, id: CategoryId) -> StoreResult<()> {
        if self.categories.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::Constraint(Constraint::UnknownCategory))
        }
    }
}

/// In-memory catalog store.
///
/// Intended for tests/dev. Both tables sit behind a single lock, so every
/// operation (including check-then-write sequences) is atomic.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("catalog lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("catalog lock poisoned".to_string()))
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn create_category(&self, new: NewCategory) -> StoreResult<Category> {
        let mut tables = self.write()?;
        tables.last_category_id += 1;
        let id = CategoryId::new(tables.last_category_id);
        let category = Category::create(id, new, Utc::now());
        tables.categories.insert(id, category.clone());
        tracing::debug!(category_id = %id, "category created");
        Ok(category)
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Category> {
        self.read()?
            .categories
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        Ok(self.read()?.categories.values().cloned().collect())
    }

    async fn update_category(&self, id: CategoryId, patch: CategoryPatch) -> StoreResult<Category> {
        let mut tables = self.write()?;
        let category = tables.categories.get_mut(&id).ok_or(StoreError::NotFound)?;
        category.apply_patch(patch);
        Ok(category.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
        let mut tables = self.write()?;
        if !tables.categories.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        if tables.products.values().any(|p| p.category == id) {
            return Err(StoreError::Constraint(Constraint::CategoryInUse));
        }
        tables.categories.remove(&id);
        tracing::debug!(category_id = %id, "category deleted");
        Ok(())
    }

    async fn count_products(&self, id: CategoryId) -> StoreResult<i64> {
        let tables = self.read()?;
        let count = tables.products.values().filter(|p| p.category == id).count();
        i64::try_from(count).map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn create_product(&self, new: NewProduct) -> StoreResult<Product> {
        let mut tables = self.write()?;
        tables.ensure_category(new.category)?;
        tables.last_product_id += 1;
        let id = ProductId::new(tables.last_product_id);
        let product = Product::create(id, new, Utc::now());
        tables.products.insert(id, product.clone());
        tracing::debug!(product_id = %id, "product created");
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        self.read()?
            .products
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        Ok(self
            .read()?
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        let mut tables = self.write()?;
        if !tables.products.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        if let Some(category) = patch.category {
            tables.ensure_category(category)?;
        }
        let product = tables.products.get_mut(&id).ok_or(StoreError::NotFound)?;
        product.apply_patch(patch, Utc::now());
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.products.remove(&id).ok_or(StoreError::NotFound)?;
        tracing::debug!(product_id = %id, "product deleted");
        Ok(())
    }

    async fn adjust_stock(&self, id: ProductId, delta: i64) -> StoreResult<Product> {
        let mut tables = self.write()?;
        let product = tables.products.get_mut(&id).ok_or(StoreError::NotFound)?;
        stockroom_inventory::adjust_stock(product, delta, Utc::now())?;
        Ok(product.clone())
    }
}
