use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockroom_core::{CategoryId, DomainError, FieldErrors, ProductId};
use stockroom_infra::{Constraint, StoreError};

use crate::app::dto;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// 400 with a `{field: [codes]}` body, keyed by wire field names.
pub fn field_errors_response(errors: FieldErrors) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(errors.rename_fields(dto::wire_field)),
    )
        .into_response()
}

pub fn not_found(what: &'static str) -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(fields) => field_errors_response(fields),
        DomainError::InsufficientStock { .. } | DomainError::StockOverflow { .. } => {
            json_error(StatusCode::BAD_REQUEST, err.code(), err.to_string())
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::Constraint(c) => match c.field() {
            Some(field) => field_errors_response(FieldErrors::single(field, c.code())),
            None => json_error(StatusCode::BAD_REQUEST, c.code(), constraint_message(c)),
        },
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "catalog store failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "internal storage error",
            )
        }
    }
}

fn constraint_message(c: Constraint) -> &'static str {
    match c {
        Constraint::UnknownCategory => "category does not exist",
        Constraint::CategoryInUse => "category still has products",
    }
}

pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub fn query_rejection_to_response(rejection: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_query", rejection.body_text())
}

// Path ids that are not positive integers can never match a record.
pub fn parse_category_id(s: &str) -> Result<CategoryId, axum::response::Response> {
    s.parse().map_err(|_| not_found("category"))
}

pub fn parse_product_id(s: &str) -> Result<ProductId, axum::response::Response> {
    s.parse().map_err(|_| not_found("product"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_status_mapping() {
        assert_eq!(
            store_error_to_response(StoreError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            store_error_to_response(StoreError::Constraint(Constraint::UnknownCategory)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            store_error_to_response(StoreError::Constraint(Constraint::CategoryInUse)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            store_error_to_response(StoreError::Domain(DomainError::InsufficientStock {
                stock: 1,
                delta: -2
            }))
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            store_error_to_response(StoreError::Backend("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn malformed_path_ids_are_not_found() {
        for raw in ["abc", "0", "-1", ""] {
            let resp = parse_product_id(raw).unwrap_err();
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{raw}");
        }
        assert_eq!(parse_category_id("7").unwrap(), CategoryId::new(7));
    }
}
