//! Product categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, DomainError, DomainResult, Entity, FieldErrors};

use crate::validation::{check, validate_name, UpdateMode};

pub const CATEGORY_NAME_MAX_LEN: usize = 100;

/// Grouping entity for products.
///
/// The number of products in a category is derived on read and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

impl Category {
    /// Materialize a category from a validated [`NewCategory`] and a store-issued id.
    pub fn create(id: CategoryId, new: NewCategory, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
            created_at: now,
            active: new.active,
        }
    }

    /// Apply a validated patch. `created_at` never changes.
    pub fn apply_patch(&mut self, patch: CategoryPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Unvalidated category input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// Validated input for creating a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub active: bool,
}

/// Validated changes to an existing category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

impl CategoryDraft {
    pub fn into_new(self) -> DomainResult<NewCategory> {
        let mut errors = FieldErrors::new();
        let name = check(&mut errors, "name", self.name, true, |n| {
            validate_name(&n, CATEGORY_NAME_MAX_LEN)
        });

        let Some(name) = name else {
            return Err(DomainError::Validation(errors));
        };
        errors.into_result()?;

        Ok(NewCategory {
            name,
            description: self.description.unwrap_or_default(),
            active: self.active.unwrap_or(true),
        })
    }

    pub fn into_patch(self, mode: UpdateMode) -> DomainResult<CategoryPatch> {
        let mut errors = FieldErrors::new();
        let name = check(&mut errors, "name", self.name, mode.requires_all(), |n| {
            validate_name(&n, CATEGORY_NAME_MAX_LEN)
        });
        errors.into_result()?;

        Ok(CategoryPatch {
            name,
            description: self.description,
            active: self.active,
        })
    }
}
