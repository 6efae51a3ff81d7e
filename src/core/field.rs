//! Field values, dotted-path access and format checks

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

/// A scalar value a filter can compare a record field against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value, integers widened to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Convert into the JSON representation stored in documents
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Float(f) => Value::from(*f),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Null => Value::Null,
        }
    }

    /// Equality against a stored JSON value.
    ///
    /// Numbers compare numerically so `3` matches `3.0`.
    pub fn matches_json(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldValue::String(s), Value::String(v)) => s == v,
            (FieldValue::Boolean(b), Value::Bool(v)) => b == v,
            (FieldValue::Null, Value::Null) => true,
            (FieldValue::Integer(_) | FieldValue::Float(_), Value::Number(n)) => {
                match (self.as_f64(), n.as_f64()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

/// Resolve a dotted path such as `address.city` inside a JSON document
pub fn lookup_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get(segment))
}

/// Field format validators shared by payload validation
#[derive(Debug, Clone)]
pub enum FieldFormat {
    Email,
    Url,
    /// Exactly ten digits, no separators
    Phone,
}

impl FieldFormat {
    /// Validate a raw string against this format
    pub fn is_valid(&self, value: &str) -> bool {
        match self {
            FieldFormat::Email => email_regex().is_match(value),
            FieldFormat::Url => url_regex().is_match(value),
            FieldFormat::Phone => phone_regex().is_match(value),
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email regex is valid")
    })
}

fn url_regex() -> &'static Regex {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    URL_REGEX.get_or_init(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("url regex is valid"))
}

fn phone_regex() -> &'static Regex {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    PHONE_REGEX.get_or_init(|| Regex::new(r"^[0-9]{10}$").expect("phone regex is valid"))
}

/// `validator` custom check for ten-digit phone numbers
pub fn validate_phone(phone: &str) -> Result<(), validator::ValidationError> {
    if FieldFormat::Phone.is_valid(phone) {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("phone");
        err.message = Some("Please enter a valid 10-digit phone number".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_match_across_representations() {
        assert!(FieldValue::Integer(3).matches_json(&json!(3.0)));
        assert!(FieldValue::Float(2.5).matches_json(&json!(2.5)));
        assert!(!FieldValue::Integer(3).matches_json(&json!("3")));
    }

    #[test]
    fn test_string_and_bool_matching() {
        assert!(FieldValue::from("Residential").matches_json(&json!("Residential")));
        assert!(!FieldValue::from("Residential").matches_json(&json!("residential")));
        assert!(FieldValue::from(true).matches_json(&json!(true)));
        assert!(FieldValue::Null.matches_json(&Value::Null));
    }

    #[test]
    fn test_lookup_nested_path() {
        let doc = json!({ "address": { "city": "Pune" }, "price": 10 });
        assert_eq!(lookup_path(&doc, "address.city"), Some(&json!("Pune")));
        assert_eq!(lookup_path(&doc, "price"), Some(&json!(10)));
        assert_eq!(lookup_path(&doc, "address.state"), None);
        assert_eq!(lookup_path(&doc, "price.value"), None);
    }

    #[test]
    fn test_phone_format() {
        assert!(FieldFormat::Phone.is_valid("9876543210"));
        assert!(!FieldFormat::Phone.is_valid("98765-43210"));
        assert!(!FieldFormat::Phone.is_valid("12345"));
        assert!(validate_phone("0123456789").is_ok());
        assert!(validate_phone("+919876543210").is_err());
    }

    #[test]
    fn test_email_and_url_format() {
        assert!(FieldFormat::Email.is_valid("someone@example.in"));
        assert!(!FieldFormat::Email.is_valid("someone@"));
        assert!(FieldFormat::Url.is_valid("https://example.com/tour"));
        assert!(!FieldFormat::Url.is_valid("ftp://example.com"));
    }
}
