use axum::Router;

pub mod categories;
pub mod products;
pub mod stock;
pub mod system;

/// Router for the catalog endpoints.
pub fn router() -> Router {
    Router::new()
        .merge(categories::router())
        .merge(products::router())
}
