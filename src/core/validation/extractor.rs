//! Axum extractor for filtered, validated payloads

use super::Payload;
use super::filters::apply_filters;
use crate::core::error::{EstateError, ValidationError};
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde_json::Value;
use validator::Validate;

/// Extracts a JSON body as `T`, after filters and validation.
///
/// Malformed JSON, type mismatches and rule violations are all rejected
/// with 400; rule violations carry per-field details.
///
/// ```rust,ignore
/// async fn create_blog(Validated(payload): Validated<NewBlog>) -> EstateResult<...> {
///     // payload already passed every rule on NewBlog
/// }
/// ```
pub struct Validated<T>(pub T);

impl<T: Payload> Validated<T> {
    /// Run filters, deserialization and validation on a raw body
    pub fn from_value(mut payload: Value) -> Result<Self, EstateError> {
        apply_filters(&mut payload, T::FILTERS);
        let value: T = serde_json::from_value(payload)?;
        value.validate()?;
        Ok(Self(value))
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: Payload,
{
    type Rejection = EstateError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload): Json<Value> = Json::from_request(req, state).await.map_err(|e| {
            EstateError::from(ValidationError::InvalidJson {
                message: e.body_text(),
            })
        })?;
        Self::from_value(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::FieldFilter;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, Validate)]
    struct Signup {
        #[validate(email)]
        email: String,
        #[validate(length(min = 2))]
        name: String,
    }

    impl Payload for Signup {
        const FILTERS: &'static [(&'static str, FieldFilter)] = &[
            ("email", FieldFilter::Trim),
            ("email", FieldFilter::Lowercase),
            ("name", FieldFilter::Trim),
        ];
    }

    #[test]
    fn test_filters_run_before_validation() {
        let Validated(signup) =
            Validated::<Signup>::from_value(json!({"email": " A@X.IN ", "name": " Jo "})).unwrap();
        assert_eq!(signup.email, "a@x.in");
        assert_eq!(signup.name, "Jo");
    }

    #[test]
    fn test_rule_violation_is_validation_error() {
        let err = Validated::<Signup>::from_value(json!({"email": "a@x.in", "name": "  J "}))
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_type_mismatch_is_invalid_json() {
        let err = Validated::<Signup>::from_value(json!({"email": 5, "name": "Jo"}))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            EstateError::Validation(ValidationError::InvalidJson { .. })
        ));
    }
}
