use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use stockroom_infra::{ProductFilter, StoreError};
use stockroom_inventory::LOW_STOCK_THRESHOLD;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// `POST /productos/{id}/actualizar-stock`: apply a signed delta to a product's stock.
pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::AdjustStockRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let id = errors::parse_product_id(&id)?;
    services
        .store()
        .get_product(id)
        .await
        .map_err(errors::store_error_to_response)?;

    let Json(body) = body.map_err(errors::json_rejection_to_response)?;
    let adjustment = body.into_adjustment().map_err(|rejection| {
        errors::json_error(StatusCode::BAD_REQUEST, rejection.code(), rejection.message())
    })?;

    let product = match services.store().adjust_stock(id, adjustment.delta).await {
        Ok(p) => p,
        Err(e) => {
            if let StoreError::Domain(domain) = &e {
                tracing::info!(
                    product_id = %id,
                    delta = adjustment.delta,
                    error = %domain,
                    "stock adjustment rejected"
                );
            }
            return Err(errors::store_error_to_response(e));
        }
    };

    tracing::info!(
        product_id = %id,
        delta = adjustment.delta,
        reason = %adjustment.reason,
        new_stock = product.stock,
        "stock adjusted"
    );

    Ok(Json(dto::stock_adjusted_to_json(&product, &adjustment)).into_response())
}

/// `GET /productos/stock-bajo`: active products below the low-stock threshold.
pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, Response> {
    let products = services
        .store()
        .list_products(&ProductFilter::low_stock(LOW_STOCK_THRESHOLD))
        .await
        .map_err(errors::store_error_to_response)?;
    let body = services
        .products_json(&products)
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(body).into_response())
}
