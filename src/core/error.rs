//! Typed error handling for the estate backend
//!
//! Every fallible operation in the crate returns [`EstateResult`]. Errors are
//! grouped by the layer that produced them so handlers can react to a
//! specific failure instead of a generic `anyhow::Error`.
//!
//! # Error Categories
//!
//! - [`EntityError`]: record lookups and uniqueness conflicts
//! - [`ValidationError`]: malformed payloads, ids and filter parameters
//! - [`StorageError`]: entity store and file store failures
//! - [`RenderError`]: template merge and PDF layout failures
//! - [`ConfigError`]: configuration parsing and validation
//!
//! Timeouts on store or render calls surface as
//! [`EstateError::DeadlineExceeded`].
//!
//! # Example
//!
//! ```rust,ignore
//! use estate::prelude::*;
//!
//! match store.find_by_id(&id).await? {
//!     Some(property) => Ok(property),
//!     None => Err(EntityError::not_found("property", id).into()),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// The main error type for the estate backend
#[derive(Debug, Error)]
pub enum EstateError {
    /// Record-level errors (lookups, conflicts)
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Request or filter validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Entity store or file store errors
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Document rendering errors
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A store or render call did not complete within its deadline
    #[error("{operation} did not complete within {timeout_ms}ms")]
    DeadlineExceeded { operation: String, timeout_ms: u64 },

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error body returned to HTTP clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`, mirrors the success envelope
    pub success: bool,
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub error: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl EstateError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            EstateError::Entity(e) => e.status_code(),
            EstateError::Validation(_) => StatusCode::BAD_REQUEST,
            EstateError::Storage(e) => e.status_code(),
            EstateError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EstateError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EstateError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
            EstateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            EstateError::Entity(e) => e.error_code(),
            EstateError::Validation(_) => "VALIDATION_ERROR",
            EstateError::Storage(e) => e.error_code(),
            EstateError::Render(_) => "RENDER_ERROR",
            EstateError::Config(_) => "CONFIG_ERROR",
            EstateError::DeadlineExceeded { .. } => "DEADLINE_EXCEEDED",
            EstateError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response body
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            success: false,
            code: self.error_code().to_string(),
            error: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            EstateError::Entity(EntityError::NotFound { entity_type, id }) => {
                Some(serde_json::json!({ "entityType": entity_type, "id": id }))
            }
            EstateError::Entity(EntityError::Duplicate { field, .. }) => {
                Some(serde_json::json!({ "field": field }))
            }
            EstateError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }

    /// Whether the failure is on the server side (logged at error level)
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for EstateError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        } else {
            tracing::debug!(code = self.error_code(), "{}", self);
        }
        (status, Json(self.to_response())).into_response()
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to record lookups and conflicts
#[derive(Debug, Error)]
pub enum EntityError {
    /// No record matched the identifier
    #[error("{entity_type} '{id}' not found")]
    NotFound { entity_type: String, id: String },

    /// A unique field already holds this value
    #[error("A {entity_type} with this {field} already exists")]
    Duplicate {
        entity_type: String,
        field: String,
        value: String,
    },
}

impl EntityError {
    pub fn not_found(entity_type: &str, id: impl ToString) -> Self {
        EntityError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(entity_type: &str, field: &str, value: impl ToString) -> Self {
        EntityError::Duplicate {
            entity_type: entity_type.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
            EntityError::Duplicate { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "NOT_FOUND",
            EntityError::Duplicate { .. } => "DUPLICATE",
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Single field validation error
    #[error("Validation error for field '{field}': {message}")]
    FieldError { field: String, message: String },

    /// Multiple field validation errors
    #[error("Validation errors: {}", join_field_errors(.0))]
    FieldErrors(Vec<FieldValidationError>),

    /// Body could not be parsed into the expected shape
    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    /// Identifier is not a valid record id
    #[error("Invalid id format: '{value}'")]
    InvalidId { value: String },
}

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

fn join_field_errors(errors: &[FieldValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        ValidationError::FieldError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors raised by the entity store or the file store
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be reached or refused the operation
    #[error("Storage backend '{backend}' is unavailable: {message}")]
    Unavailable { backend: String, message: String },

    /// Backend accepted the query but failed to execute it
    #[error("{backend} query error: {message}")]
    QueryError { backend: String, message: String },

    /// Stored data could not be mapped back to a record
    #[error("Corrupt {entity_type} record: {message}")]
    Corrupt { entity_type: String, message: String },

    /// File store I/O failure
    #[error("File storage error for '{path}': {message}")]
    File { path: String, message: String },
}

impl StorageError {
    pub fn unavailable(backend: &str, message: impl ToString) -> Self {
        StorageError::Unavailable {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            StorageError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            StorageError::QueryError { .. } => StatusCode::SERVICE_UNAVAILABLE,
            StorageError::Corrupt { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            StorageError::File { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::Unavailable { .. } => "STORE_UNAVAILABLE",
            StorageError::QueryError { .. } => "STORE_UNAVAILABLE",
            StorageError::Corrupt { .. } => "STORE_CORRUPT_RECORD",
            StorageError::File { .. } => "FILE_STORAGE_ERROR",
        }
    }
}

// =============================================================================
// Render Errors
// =============================================================================

/// Errors raised while turning a record into a document
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template id is not registered with the renderer
    #[error("Unknown document template '{0}'")]
    UnknownTemplate(String),

    /// Template merge failed
    #[error("PDF generation failed: template '{template}': {message}")]
    Template { template: String, message: String },

    /// Layout or serialization of the PDF failed
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    /// Rendered bytes could not be stored
    #[error("PDF generation failed: could not store document: {0}")]
    Output(String),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML could not be parsed
    #[error("Failed to parse config {}: {message}", .file.as_deref().unwrap_or("<inline>"))]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// A value is outside its allowed domain
    #[error("Invalid value '{value}' for '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Config file could not be read
    #[error("Config I/O error: {message}")]
    IoError { message: String },
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for EstateError {
    fn from(err: serde_json::Error) -> Self {
        EstateError::Validation(ValidationError::InvalidJson {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for EstateError {
    fn from(err: serde_yaml::Error) -> Self {
        EstateError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<validator::ValidationErrors> for EstateError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        flatten_validation_errors("", &errors, &mut fields);
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        EstateError::Validation(ValidationError::FieldErrors(fields))
    }
}

/// Walk nested `validator` errors into dotted field paths (`address.city`,
/// `images[0].url`).
fn flatten_validation_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<FieldValidationError>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for e in list {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", e.code));
                    out.push(FieldValidationError {
                        field: path.clone(),
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_validation_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_validation_errors(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

/// A specialized Result type for estate operations
pub type EstateResult<T> = Result<T, EstateError>;
