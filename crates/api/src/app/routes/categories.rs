use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use stockroom_products::UpdateMode;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/categorias", get(list_categories).post(create_category))
        .route(
            "/categorias/:id",
            get(get_category)
                .put(replace_category)
                .patch(update_category)
                .delete(delete_category),
        )
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, Response> {
    let categories = services
        .store()
        .list_categories()
        .await
        .map_err(errors::store_error_to_response)?;
    let body = services
        .categories_json(&categories)
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(body).into_response())
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CategoryRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let Json(body) = body.map_err(errors::json_rejection_to_response)?;
    let new = body
        .into_new()
        .map_err(errors::domain_error_to_response)?;

    let category = services
        .store()
        .create_category(new)
        .await
        .map_err(errors::store_error_to_response)?;
    tracing::info!(category_id = %category.id, "category created");

    let body = services
        .category_json(&category)
        .await
        .map_err(errors::store_error_to_response)?;
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    let id = errors::parse_category_id(&id)?;
    let category = services
        .store()
        .get_category(id)
        .await
        .map_err(errors::store_error_to_response)?;
    let body = services
        .category_json(&category)
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(body).into_response())
}

pub async fn replace_category(
    services: Extension<Arc<AppServices>>,
    id: Path<String>,
    body: Result<Json<dto::CategoryRequest>, JsonRejection>,
) -> Result<Response, Response> {
    write_category(services, id, body, UpdateMode::Replace).await
}

pub async fn update_category(
    services: Extension<Arc<AppServices>>,
    id: Path<String>,
    body: Result<Json<dto::CategoryRequest>, JsonRejection>,
) -> Result<Response, Response> {
    write_category(services, id, body, UpdateMode::Merge).await
}

async fn write_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::CategoryRequest>, JsonRejection>,
    mode: UpdateMode,
) -> Result<Response, Response> {
    let id = errors::parse_category_id(&id)?;
    // An unknown id is a 404 even when the body is also invalid.
    services
        .store()
        .get_category(id)
        .await
        .map_err(errors::store_error_to_response)?;

    let Json(body) = body.map_err(errors::json_rejection_to_response)?;
    let patch = body
        .into_patch(mode)
        .map_err(errors::domain_error_to_response)?;

    let category = services
        .store()
        .update_category(id, patch)
        .await
        .map_err(errors::store_error_to_response)?;
    let body = services
        .category_json(&category)
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(body).into_response())
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    let id = errors::parse_category_id(&id)?;
    services
        .store()
        .delete_category(id)
        .await
        .map_err(errors::store_error_to_response)?;
    tracing::info!(category_id = %id, "category deleted");

    Ok(StatusCode::NO_CONTENT.into_response())
}
