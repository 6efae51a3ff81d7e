//! Field filters applied to raw payloads before validation

use serde_json::Value;

/// A string transformation applied to one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFilter {
    Trim,
    Lowercase,
    Uppercase,
}

impl FieldFilter {
    /// Apply to a single value; non-strings pass through
    pub fn apply(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(match self {
                FieldFilter::Trim => s.trim().to_string(),
                FieldFilter::Lowercase => s.to_lowercase(),
                FieldFilter::Uppercase => s.to_uppercase(),
            }),
            other => other,
        }
    }
}

/// Apply `filters` in order to the fields they name.
///
/// Paths are dotted (`address.city`). Missing fields are left alone.
pub fn apply_filters(payload: &mut Value, filters: &[(&str, FieldFilter)]) {
    for (path, filter) in filters {
        if let Some(slot) = lookup_mut(payload, path) {
            *slot = filter.apply(slot.take());
        }
    }
}

fn lookup_mut<'a>(document: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get_mut(segment))
}
