//! Postgres-backed catalog store.
//!
//! The schema (`schema.sql`) also enforces referential integrity, the
//! positive price and the non-negative stock invariants.
//!
//! ## Error Mapping
//!
//! | PostgreSQL Error Code | StoreError | Scenario |
//! |----------------------|------------|----------|
//! | `23503` (foreign key) | `Constraint(UnknownCategory)` / `Constraint(CategoryInUse)` | Dangling category on insert/update; delete of a referenced category |
//! | `23514` (check) | `Domain(Validation)` | Non-positive price or negative stock reached the database |
//! | Any other | `Backend` | Connection failures, syntax errors, etc. |

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::instrument;

use stockroom_core::{CategoryId, DomainError, ProductId};
use stockroom_inventory::checked_adjust;
use stockroom_products::{
    Category, CategoryPatch, NewCategory, NewProduct, Price, Product, ProductPatch,
};

use super::filter::ProductFilter;
use super::r#trait::{CatalogStore, Constraint, StoreError, StoreResult};

const SCHEMA: &str = include_str!("schema.sql");

/// Conditional updates tried before a contended adjustment is given up.
const ADJUST_ATTEMPTS: usize = 3;

const ADJUST_STOCK_SQL: &str = r#"
    UPDATE products
    SET stock = stock + $2,
        updated_at = NOW()
    WHERE id = $1
      AND stock::numeric + $2 >= 0
      AND stock::numeric + $2 <= 9223372036854775807
    RETURNING id, name, description, price, stock, category_id,
              created_at, updated_at, active
"#;

const PRODUCT_SELECT: &str = "SELECT id, name, description, price, stock, category_id, \
     created_at, updated_at, active FROM products";

/// Postgres-backed catalog store.
///
/// Uses the SQLx connection pool, which is `Send + Sync` and cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[instrument(skip(self, new), err)]
    async fn create_category(&self, new: NewCategory) -> StoreResult<Category> {
        let row = sqlx::query(
            r#"
            INSERT INTO categories (name, description, active)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_at, active
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_category", e))?;

        category_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn get_category(&self, id: CategoryId) -> StoreResult<Category> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, created_at, active
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_category", e))?
        .ok_or(StoreError::NotFound)?;

        category_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, created_at, active
            FROM categories
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_categories", e))?;

        rows.iter().map(category_from_row).collect()
    }

    #[instrument(skip(self, patch), err)]
    async fn update_category(&self, id: CategoryId, patch: CategoryPatch) -> StoreResult<Category> {
        let row = sqlx::query(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                active = COALESCE($4, active)
            WHERE id = $1
            RETURNING id, name, description, created_at, active
            "#,
        )
        .bind(id.get())
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_category", e))?
        .ok_or(StoreError::NotFound)?;

        category_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| match map_sqlx_error("delete_category", e) {
                // The only foreign key points at categories from products.
                StoreError::Constraint(_) => StoreError::Constraint(Constraint::CategoryInUse),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn count_products(&self, id: CategoryId) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_products", e))
    }

    #[instrument(skip(self, new), err)]
    async fn create_product(&self, new: NewProduct) -> StoreResult<Product> {
        let row = sqlx::query(
            r#"
            INSERT INTO products (name, description, price, stock, category_id, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, price, stock, category_id,
                      created_at, updated_at, active
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price.amount())
        .bind(new.stock)
        .bind(new.category.get())
        .bind(new.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_product", e))?;

        product_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        let row = sqlx::query(&format!("{PRODUCT_SELECT} WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?
            .ok_or(StoreError::NotFound)?;

        product_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        let mut query = product_list_query(filter);
        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self, patch), err)]
    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                stock = COALESCE($5, stock),
                category_id = COALESCE($6, category_id),
                active = COALESCE($7, active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, price, stock, category_id,
                      created_at, updated_at, active
            "#,
        )
        .bind(id.get())
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.price.map(|p| p.amount()))
        .bind(patch.stock)
        .bind(patch.category.map(CategoryId::get))
        .bind(patch.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?
        .ok_or(StoreError::NotFound)?;

        product_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Single conditional update: the row changes only if the new quantity is
    /// in range, so concurrent adjustments serialize on the row lock.
    #[instrument(skip(self), err)]
    async fn adjust_stock(&self, id: ProductId, delta: i64) -> StoreResult<Product> {
        for _ in 0..ADJUST_ATTEMPTS {
            let updated = sqlx::query(ADJUST_STOCK_SQL)
                .bind(id.get())
                .bind(delta)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("adjust_stock", e))?;

            if let Some(row) = updated {
                return product_from_row(&row);
            }

            // Nothing changed: either the product is missing or the delta was rejected.
            let stock = sqlx::query_scalar::<_, i64>("SELECT stock FROM products WHERE id = $1")
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("adjust_stock", e))?;

            if let Some(err) = rejected_adjustment(stock, delta) {
                return Err(err);
            }
            tracing::debug!(product_id = %id, delta, "stock changed under adjustment; retrying");
        }

        Err(StoreError::Backend(format!(
            "stock of product {id} kept changing during adjustment"
        )))
    }
}

/// Why a conditional stock update matched no row, judged on the stock read
/// right after it. `None` means the current stock accepts the delta.
fn rejected_adjustment(stock: Option<i64>, delta: i64) -> Option<StoreError> {
    match stock {
        None => Some(StoreError::NotFound),
        Some(stock) => checked_adjust(stock, delta).err().map(StoreError::from),
    }
}

/// Build the filtered listing query; filters are ANDed, results in insertion order.
fn product_list_query(filter: &ProductFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(PRODUCT_SELECT);
    query.push(" WHERE TRUE");

    if let Some(needle) = &filter.name_contains {
        query
            .push(" AND name ILIKE ")
            .push_bind(format!("%{}%", escape_like(needle)));
    }
    if let Some(category) = filter.category {
        query.push(" AND category_id = ").push_bind(category.get());
    }
    if let Some(min) = filter.min_price {
        query.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        query.push(" AND price <= ").push_bind(max);
    }
    if let Some(limit) = filter.stock_below {
        query.push(" AND stock < ").push_bind(limit);
    }
    if let Some(active) = filter.active {
        query.push(" AND active = ").push_bind(active);
    }

    query.push(" ORDER BY id ASC");
    query
}

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn category_from_row(row: &PgRow) -> StoreResult<Category> {
    let decode = |e| map_sqlx_error("decode category", e);
    Ok(Category {
        id: CategoryId::new(row.try_get("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode)?,
        active: row.try_get("active").map_err(decode)?,
    })
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    let decode = |e| map_sqlx_error("decode product", e);
    let id: i64 = row.try_get("id").map_err(decode)?;
    let price: Decimal = row.try_get("price").map_err(decode)?;
    let price = Price::new(price)
        .map_err(|e| StoreError::Backend(format!("invalid stored price for product {id}: {e}")))?;

    Ok(Product {
        id: ProductId::new(id),
        name: row.try_get("name").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        price,
        stock: row.try_get("stock").map_err(decode)?,
        category: CategoryId::new(row.try_get("category_id").map_err(decode)?),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(decode)?,
        active: row.try_get("active").map_err(decode)?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23503") => StoreError::Constraint(Constraint::UnknownCategory),
                Some("23514") => match db_err.constraint() {
                    Some("products_price_check") => {
                        DomainError::validation("price", "price_must_be_positive").into()
                    }
                    Some("products_stock_check") => {
                        DomainError::validation("stock", "stock_must_be_nonnegative").into()
                    }
                    _ => StoreError::Backend(msg),
                },
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_lists_everything_in_insertion_order() {
        let query = product_list_query(&ProductFilter::default());
        assert_eq!(
            query.sql(),
            format!("{PRODUCT_SELECT} WHERE TRUE ORDER BY id ASC")
        );
    }

    #[test]
    fn filters_are_anded_with_bound_parameters() {
        let filter = ProductFilter {
            name_contains: Some("cab".to_string()),
            category: Some(CategoryId::new(3)),
            min_price: Some(Decimal::new(1, 0)),
            max_price: Some(Decimal::new(9, 0)),
            stock_below: None,
            active: Some(true),
        };
        let query = product_list_query(&filter);
        assert!(query.sql().ends_with(
            " WHERE TRUE AND name ILIKE $1 AND category_id = $2 AND price >= $3 \
             AND price <= $4 AND active = $5 ORDER BY id ASC"
        ));
    }

    #[test]
    fn low_stock_filter_uses_strict_bound() {
        let query = product_list_query(&ProductFilter::low_stock(10));
        assert!(query.sql().contains(" AND stock < $1 AND active = $2"));
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like(r"50%_off\"), r"50\%\_off\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn missing_rows_map_to_not_found() {
        assert!(matches!(
            map_sqlx_error("get_product", sqlx::Error::RowNotFound),
            StoreError::NotFound
        ));
    }

    #[test]
    fn missed_adjustment_is_judged_on_the_stock_read_afterwards() {
        assert!(matches!(rejected_adjustment(None, -1), Some(StoreError::NotFound)));
        assert!(matches!(
            rejected_adjustment(Some(2), -3),
            Some(StoreError::Domain(DomainError::InsufficientStock { stock: 2, delta: -3 }))
        ));
        assert!(matches!(
            rejected_adjustment(Some(i64::MAX), 1),
            Some(StoreError::Domain(DomainError::StockOverflow { .. }))
        ));
        // The row changed between the update and the read; the caller retries.
        assert!(rejected_adjustment(Some(5), -3).is_none());
    }
}
