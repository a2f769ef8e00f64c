use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use stockroom_infra::{StoreConfig, StoreResult};

use crate::middleware::request_context;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Open the configured store and build the full router around it.
pub async fn build_app(store: &StoreConfig) -> StoreResult<Router> {
    let store = store.open().await?;
    Ok(router(Arc::new(AppServices::new(store))))
}

/// Router over an already-opened set of services.
pub fn router(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_context))
                .layer(Extension(services)),
        )
}
