use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use stockroom_core::{CategoryId, DomainError, DomainResult, FieldErrors};
use stockroom_infra::ProductFilter;
use stockroom_inventory::StockAdjustment;
use stockroom_products::{
    Category, CategoryDraft, CategoryPatch, NewCategory, NewProduct, Product, ProductDraft,
    ProductPatch, UpdateMode,
};

/// Body of category create/update requests.
///
/// Fields are kept raw so that a value of the wrong type is reported under
/// its own field alongside the other validation failures.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryRequest {
    #[serde(default)]
    pub nombre: Option<Value>,
    #[serde(default)]
    pub descripcion: Option<Value>,
    #[serde(default)]
    pub activo: Option<Value>,
}

impl CategoryRequest {
    /// Typed draft plus the fields whose values had the wrong type.
    pub fn into_draft(self) -> (CategoryDraft, FieldErrors) {
        let mut errors = FieldErrors::new();
        let draft = CategoryDraft {
            name: typed(&mut errors, "name", self.nombre, string_value),
            description: typed(&mut errors, "description", self.descripcion, string_value),
            active: typed(&mut errors, "active", self.activo, bool_value),
        };
        (draft, errors)
    }

    pub fn into_new(self) -> DomainResult<NewCategory> {
        let (draft, type_errors) = self.into_draft();
        with_type_errors(draft.into_new(), type_errors)
    }

    pub fn into_patch(self, mode: UpdateMode) -> DomainResult<CategoryPatch> {
        let (draft, type_errors) = self.into_draft();
        with_type_errors(draft.into_patch(mode), type_errors)
    }
}

/// Body of product create/update requests. Raw for the same reason as
/// [`CategoryRequest`].
#[derive(Debug, Default, Deserialize)]
pub struct ProductRequest {
    #[serde(default)]
    pub nombre: Option<Value>,
    #[serde(default)]
    pub descripcion: Option<Value>,
    #[serde(default)]
    pub precio: Option<Value>,
    #[serde(default)]
    pub stock: Option<Value>,
    #[serde(default)]
    pub categoria: Option<Value>,
    #[serde(default)]
    pub activo: Option<Value>,
}

impl ProductRequest {
    /// Typed draft plus the fields whose values had the wrong type.
    pub fn into_draft(self) -> (ProductDraft, FieldErrors) {
        let mut errors = FieldErrors::new();
        let draft = ProductDraft {
            name: typed(&mut errors, "name", self.nombre, string_value),
            description: typed(&mut errors, "description", self.descripcion, string_value),
            price: typed(&mut errors, "price", self.precio, decimal_value),
            stock: typed(&mut errors, "stock", self.stock, integer_value),
            category: typed(&mut errors, "category", self.categoria, |v| {
                integer_value(v).filter(|id| *id > 0).map(CategoryId::new)
            }),
            active: typed(&mut errors, "active", self.activo, bool_value),
        };
        (draft, errors)
    }

    pub fn into_new(self) -> DomainResult<NewProduct> {
        let (draft, type_errors) = self.into_draft();
        with_type_errors(draft.into_new(), type_errors)
    }

    pub fn into_patch(self, mode: UpdateMode) -> DomainResult<ProductPatch> {
        let (draft, type_errors) = self.into_draft();
        with_type_errors(draft.into_patch(mode), type_errors)
    }
}

/// Convert a raw field, recording `invalid` under `field` when the value has the wrong type.
fn typed<T>(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<Value>,
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let raw = raw?;
    let converted = convert(&raw);
    if converted.is_none() {
        errors.push(field, "invalid");
    }
    converted
}

// A field with a type error is absent from the draft, so its `required`
// code is replaced by `invalid`.
fn with_type_errors<T>(result: DomainResult<T>, type_errors: FieldErrors) -> DomainResult<T> {
    if type_errors.is_empty() {
        return result;
    }
    let mut errors = match result {
        Ok(_) => FieldErrors::new(),
        Err(DomainError::Validation(errors)) => errors,
        Err(other) => return Err(other),
    };
    errors.overlay(type_errors);
    Err(DomainError::Validation(errors))
}

fn string_value(value: &Value) -> Option<String> {
    value.as_str().map(str::to_owned)
}

fn bool_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => parse_bool(s.trim()),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn decimal_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// A JSON integer, an integral float, or a string holding an integer.
fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f))
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Body of `POST /productos/{id}/actualizar-stock`.
///
/// `cantidad` is kept raw so that a missing value and a non-integer value
/// can be reported separately.
#[derive(Debug, Default, Deserialize)]
pub struct AdjustStockRequest {
    #[serde(default)]
    pub cantidad: Option<Value>,
    #[serde(default)]
    pub motivo: Option<String>,
}

/// Why an adjustment body was rejected.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AdjustStockRejection {
    Missing,
    NotAnInteger,
}

impl AdjustStockRejection {
    pub fn code(self) -> &'static str {
        match self {
            AdjustStockRejection::Missing => "cantidad_required",
            AdjustStockRejection::NotAnInteger => "cantidad_must_be_integer",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            AdjustStockRejection::Missing => "La cantidad es requerida",
            AdjustStockRejection::NotAnInteger => "La cantidad debe ser un número entero",
        }
    }
}

impl AdjustStockRequest {
    /// Accepts a JSON integer, an integral float such as `-5.0`, or a string
    /// holding an integer. Fractional numbers are rejected.
    pub fn into_adjustment(self) -> Result<StockAdjustment, AdjustStockRejection> {
        let raw = self.cantidad.ok_or(AdjustStockRejection::Missing)?;
        let delta = integer_value(&raw).ok_or(AdjustStockRejection::NotAnInteger)?;

        Ok(StockAdjustment::new(delta, self.motivo))
    }
}

/// Query string of `GET /productos`. Every parameter is optional and an
/// empty value is the same as an absent one.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub categoria: Option<String>,
    pub min_precio: Option<String>,
    pub max_precio: Option<String>,
    pub activo: Option<String>,
}

impl ProductListQuery {
    /// Parse into a store filter. Errors are keyed by query parameter name.
    pub fn into_filter(self) -> Result<ProductFilter, FieldErrors> {
        let mut errors = FieldErrors::new();

        let filter = ProductFilter {
            name_contains: non_empty(self.search),
            category: parse_param(&mut errors, "categoria", self.categoria, |s| {
                CategoryId::from_str(s).ok()
            }),
            min_price: parse_param(&mut errors, "min_precio", self.min_precio, |s| {
                Decimal::from_str(s).ok()
            }),
            max_price: parse_param(&mut errors, "max_precio", self.max_precio, |s| {
                Decimal::from_str(s).ok()
            }),
            stock_below: None,
            active: parse_param(&mut errors, "activo", self.activo, parse_bool),
        };

        if errors.is_empty() {
            Ok(filter)
        } else {
            Err(errors)
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_param<T>(
    errors: &mut FieldErrors,
    name: &str,
    raw: Option<String>,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = non_empty(raw)?;
    match parse(&raw) {
        Some(v) => Some(v),
        None => {
            errors.push(name, "invalid");
            None
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Domain field name to the name used on the wire.
pub fn wire_field(field: &str) -> String {
    match field {
        "name" => "nombre",
        "description" => "descripcion",
        "price" => "precio",
        "category" => "categoria",
        "active" => "activo",
        other => other,
    }
    .to_string()
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn category_to_json(category: &Category, product_count: i64) -> Value {
    json!({
        "id": category.id,
        "nombre": category.name,
        "descripcion": category.description,
        "fecha_creacion": timestamp(category.created_at),
        "activo": category.active,
        "producto_count": product_count,
    })
}

pub fn product_to_json(product: &Product, category_name: &str) -> Value {
    json!({
        "id": product.id,
        "nombre": product.name,
        "descripcion": product.description,
        "precio": product.price.amount().to_string(),
        "stock": product.stock,
        "categoria": product.category,
        "categoria_nombre": category_name,
        "fecha_creacion": timestamp(product.created_at),
        "fecha_actualizacion": timestamp(product.updated_at),
        "activo": product.active,
    })
}

pub fn stock_adjusted_to_json(product: &Product, adjustment: &StockAdjustment) -> Value {
    json!({
        "producto": product.name,
        "nuevo_stock": product.stock,
        "mensaje": adjustment.message(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjust(body: Value) -> Result<StockAdjustment, AdjustStockRejection> {
        serde_json::from_value::<AdjustStockRequest>(body)
            .unwrap()
            .into_adjustment()
    }

    #[test]
    fn cantidad_accepts_integers_and_integer_strings() {
        assert_eq!(adjust(json!({"cantidad": -3})).unwrap().delta, -3);
        assert_eq!(adjust(json!({"cantidad": " 12 "})).unwrap().delta, 12);
        assert_eq!(adjust(json!({"cantidad": -5.0})).unwrap().delta, -5);
        assert_eq!(
            adjust(json!({"cantidad": 0, "motivo": "conteo"})).unwrap().reason,
            "conteo"
        );
    }

    #[test]
    fn cantidad_rejections() {
        assert_eq!(adjust(json!({})).unwrap_err(), AdjustStockRejection::Missing);
        assert_eq!(
            adjust(json!({"cantidad": null})).unwrap_err(),
            AdjustStockRejection::Missing
        );
        for bad in [json!("abc"), json!(1.5), json!(1e30), json!("2.0"), json!(true), json!([1])] {
            assert_eq!(
                adjust(json!({ "cantidad": bad })).unwrap_err(),
                AdjustStockRejection::NotAnInteger
            );
        }
    }

    #[test]
    fn empty_query_params_are_ignored() {
        let q = ProductListQuery {
            search: Some("  ".into()),
            categoria: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(q.into_filter().unwrap(), ProductFilter::default());
    }

    #[test]
    fn query_params_parse() {
        let q = ProductListQuery {
            search: Some("Lap".into()),
            categoria: Some("2".into()),
            min_precio: Some("10".into()),
            max_precio: Some("99.50".into()),
            activo: Some("False".into()),
        };
        let f = q.into_filter().unwrap();
        assert_eq!(f.name_contains.as_deref(), Some("Lap"));
        assert_eq!(f.category, Some(CategoryId::new(2)));
        assert_eq!(f.min_price, Some(Decimal::new(10, 0)));
        assert_eq!(f.max_price, Some(Decimal::new(9950, 2)));
        assert_eq!(f.active, Some(false));
    }

    #[test]
    fn invalid_query_params_are_reported_by_name() {
        let q = ProductListQuery {
            categoria: Some("x".into()),
            min_precio: Some("cheap".into()),
            activo: Some("maybe".into()),
            ..Default::default()
        };
        let errors = q.into_filter().unwrap_err();
        assert!(errors.get("categoria").is_some());
        assert!(errors.get("min_precio").is_some());
        assert!(errors.get("activo").is_some());
        assert!(errors.get("max_precio").is_none());
    }

    fn product(body: Value) -> ProductRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn wrongly_typed_fields_are_reported_with_the_other_field_errors() {
        let err = product(json!({
            "nombre": "Cable",
            "precio": "abc",
            "stock": -1,
            "categoria": "x",
            "activo": "quizas",
        }))
        .into_new()
        .unwrap_err();

        let DomainError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.get("price").unwrap(), ["invalid"]);
        assert_eq!(errors.get("category").unwrap(), ["invalid"]);
        assert_eq!(errors.get("active").unwrap(), ["invalid"]);
        assert_eq!(errors.get("stock").unwrap(), ["stock_must_be_nonnegative"]);
        assert!(errors.get("name").is_none());
    }

    #[test]
    fn numeric_fields_accept_strings() {
        let new = product(json!({
            "nombre": "Cable",
            "precio": "5.5",
            "stock": "20",
            "categoria": "3",
            "activo": "false",
        }))
        .into_new()
        .unwrap();

        assert_eq!(new.price.amount(), Decimal::new(550, 2));
        assert_eq!(new.stock, 20);
        assert_eq!(new.category, CategoryId::new(3));
        assert!(!new.active);
    }

    #[test]
    fn type_errors_fail_partial_updates_too() {
        let err = product(json!({ "stock": 2.5 }))
            .into_patch(UpdateMode::Merge)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation(FieldErrors::single("stock", "invalid"))
        );

        let err = CategoryRequest {
            nombre: Some(json!(42)),
            ..Default::default()
        }
        .into_new()
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation(FieldErrors::single("name", "invalid"))
        );
    }

    #[test]
    fn wire_names() {
        assert_eq!(wire_field("price"), "precio");
        assert_eq!(wire_field("stock"), "stock");
        assert_eq!(wire_field("min_precio"), "min_precio");
    }
}
