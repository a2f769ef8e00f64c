use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use stockroom_products::UpdateMode;

use crate::app::routes::stock;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/productos", get(list_products).post(create_product))
        .route("/productos/stock-bajo", get(stock::low_stock))
        .route(
            "/productos/:id",
            get(get_product)
                .put(replace_product)
                .patch(update_product)
                .delete(delete_product),
        )
        .route("/productos/:id/actualizar-stock", post(stock::adjust_stock))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::ProductListQuery>, QueryRejection>,
) -> Result<Response, Response> {
    let Query(query) = query.map_err(errors::query_rejection_to_response)?;
    let filter = query
        .into_filter()
        .map_err(errors::field_errors_response)?;

    let products = services
        .store()
        .list_products(&filter)
        .await
        .map_err(errors::store_error_to_response)?;
    let body = services
        .products_json(&products)
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(body).into_response())
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::ProductRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let Json(body) = body.map_err(errors::json_rejection_to_response)?;
    let new = body
        .into_new()
        .map_err(errors::domain_error_to_response)?;

    let product = services
        .store()
        .create_product(new)
        .await
        .map_err(errors::store_error_to_response)?;
    tracing::info!(
        product_id = %product.id,
        category_id = %product.category,
        stock = product.stock,
        "product created"
    );

    let body = services
        .product_json(&product)
        .await
        .map_err(errors::store_error_to_response)?;
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    let id = errors::parse_product_id(&id)?;
    let product = services
        .store()
        .get_product(id)
        .await
        .map_err(errors::store_error_to_response)?;
    let body = services
        .product_json(&product)
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(body).into_response())
}

pub async fn replace_product(
    services: Extension<Arc<AppServices>>,
    id: Path<String>,
    body: Result<Json<dto::ProductRequest>, JsonRejection>,
) -> Result<Response, Response> {
    write_product(services, id, body, UpdateMode::Replace).await
}

pub async fn update_product(
    services: Extension<Arc<AppServices>>,
    id: Path<String>,
    body: Result<Json<dto::ProductRequest>, JsonRejection>,
) -> Result<Response, Response> {
    write_product(services, id, body, UpdateMode::Merge).await
}

async fn write_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::ProductRequest>, JsonRejection>,
    mode: UpdateMode,
) -> Result<Response, Response> {
    let id = errors::parse_product_id(&id)?;
    // An unknown id is a 404 even when the body is also invalid.
    services
        .store()
        .get_product(id)
        .await
        .map_err(errors::store_error_to_response)?;

    let Json(body) = body.map_err(errors::json_rejection_to_response)?;
    let patch = body
        .into_patch(mode)
        .map_err(errors::domain_error_to_response)?;

    let product = services
        .store()
        .update_product(id, patch)
        .await
        .map_err(errors::store_error_to_response)?;
    let body = services
        .product_json(&product)
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(body).into_response())
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    let id = errors::parse_product_id(&id)?;
    services
        .store()
        .delete_product(id)
        .await
        .map_err(errors::store_error_to_response)?;
    tracing::info!(product_id = %id, "product deleted");

    Ok(StatusCode::NO_CONTENT.into_response())
}
