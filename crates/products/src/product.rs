//! Products: inventory items with a price, a stock quantity and a category.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, DomainError, DomainResult, Entity, FieldErrors, ProductId};

use crate::price::Price;
use crate::validation::{check, validate_name, validate_stock, UpdateMode};

pub const PRODUCT_NAME_MAX_LEN: usize = 200;

/// Inventory item.
///
/// `stock` is never negative. Updates go through [`Product::apply_patch`];
/// relative stock changes are the inventory crate's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: i64,
    pub category: CategoryId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active: bool,
}

impl Product {
    /// Materialize a product from a validated [`NewProduct`] and a store-issued id.
    pub fn create(id: ProductId, new: NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
            price: new.price,
            stock: new.stock,
            category: new.category,
            created_at: now,
            updated_at: now,
            active: new.active,
        }
    }

    /// Apply a validated patch and refresh `updated_at`.
    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        self.updated_at = now;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Unvalidated product input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    pub category: Option<CategoryId>,
    pub active: Option<bool>,
}

/// Validated input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: i64,
    pub category: CategoryId,
    pub active: bool,
}

/// Validated changes to an existing product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub stock: Option<i64>,
    pub category: Option<CategoryId>,
    pub active: Option<bool>,
}

struct CheckedFields {
    name: Option<String>,
    price: Option<Price>,
    stock: Option<i64>,
    category: Option<CategoryId>,
}

impl ProductDraft {
    /// Validate every field, aggregating all failures into one error.
    fn check_fields(&self, required: bool, errors: &mut FieldErrors) -> CheckedFields {
        CheckedFields {
            name: check(errors, "name", self.name.clone(), required, |n| {
                validate_name(&n, PRODUCT_NAME_MAX_LEN)
            }),
            price: check(errors, "price", self.price, required, Price::new),
            stock: check(errors, "stock", self.stock, false, validate_stock),
            category: check(errors, "category", self.category, required, Ok),
        }
    }

    pub fn into_new(self) -> DomainResult<NewProduct> {
        let mut errors = FieldErrors::new();
        let fields = self.check_fields(true, &mut errors);

        let (Some(name), Some(price), Some(category)) = (fields.name, fields.price, fields.category)
        else {
            return Err(DomainError::Validation(errors));
        };
        errors.into_result()?;

        Ok(NewProduct {
            name,
            description: self.description.unwrap_or_default(),
            price,
            stock: fields.stock.unwrap_or(0),
            category,
            active: self.active.unwrap_or(true),
        })
    }

    pub fn into_patch(self, mode: UpdateMode) -> DomainResult<ProductPatch> {
        let mut errors = FieldErrors::new();
        let fields = self.check_fields(mode.requires_all(), &mut errors);
        errors.into_result()?;

        Ok(ProductPatch {
            name: fields.name,
            description: self.description,
            price: fields.price,
            stock: fields.stock,
            category: fields.category,
            active: self.active,
        })
    }
}
