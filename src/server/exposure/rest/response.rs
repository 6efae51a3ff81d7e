//! Response envelopes shared by the REST handlers
//!
//! - single record: `{"success": true, "data": {...}}`
//! - paginated list: `{"success": true, "data": [...], "pagination": {...}}`
//! - plain list: `{"success": true, "count": n, "data": [...]}`

use crate::core::error::{EstateResult, ValidationError};
use crate::core::query::PageResult;
use axum::{Json, http::StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub success: bool,
    #[serde(flatten)]
    pub page: PageResult<T>,
}

pub fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

pub fn ok_message<T: Serialize>(message: &str, data: T) -> Json<Value> {
    Json(json!({ "success": true, "message": message, "data": data }))
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, ok(data))
}

pub fn counted<T: Serialize>(items: Vec<T>) -> Json<Value> {
    Json(json!({ "success": true, "count": items.len(), "data": items }))
}

pub fn paged<T: Serialize>(page: PageResult<T>) -> Json<Paged<T>> {
    Json(Paged {
        success: true,
        page,
    })
}

/// Body of a successful delete
pub fn deleted() -> Json<Value> {
    ok(json!({}))
}

/// `Content-Disposition` value for a download named `file_name`.
///
/// The quoted `filename` carries an ASCII fallback (characters outside
/// `[A-Za-z0-9._-]` become `_`); `filename*` carries the exact name,
/// percent-encoded as UTF-8. Both are always valid header text.
pub fn attachment(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}

/// Parse a path id, rejecting anything that is not a UUID
pub fn parse_id(raw: &str) -> EstateResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        ValidationError::InvalidId {
            value: raw.to_string(),
        }
        .into()
    })
}
