use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use stockroom_core::CategoryId;
use stockroom_infra::{CatalogStore, StoreError, StoreResult};
use stockroom_products::{Category, Product};

use crate::app::dto;

/// Shared handler state.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn CatalogStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    /// Category representation with its live product count.
    pub async fn category_json(&self, category: &Category) -> StoreResult<Value> {
        let count = self.store.count_products(category.id).await?;
        Ok(dto::category_to_json(category, count))
    }

    pub async fn categories_json(&self, categories: &[Category]) -> StoreResult<Vec<Value>> {
        let mut out = Vec::with_capacity(categories.len());
        for category in categories {
            out.push(self.category_json(category).await?);
        }
        Ok(out)
    }

    /// Product representation including the owning category's name.
    pub async fn product_json(&self, product: &Product) -> StoreResult<Value> {
        let category = match self.store.get_category(product.category).await {
            Ok(c) => c,
            Err(StoreError::NotFound) => return Err(dangling(product)),
            Err(e) => return Err(e),
        };
        Ok(dto::product_to_json(product, &category.name))
    }

    pub async fn products_json(&self, products: &[Product]) -> StoreResult<Vec<Value>> {
        let names: HashMap<CategoryId, String> = self
            .store
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        products
            .iter()
            .map(|p| {
                let name = names.get(&p.category).ok_or_else(|| dangling(p))?;
                Ok(dto::product_to_json(p, name))
            })
            .collect()
    }
}

fn dangling(product: &Product) -> StoreError {
    StoreError::Backend(format!(
        "product {} references missing category {}",
        product.id, product.category
    ))
}
