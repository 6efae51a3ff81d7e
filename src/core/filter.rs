//! Filter specifications and the query builder
//!
//! Raw query-string parameters are turned into a [`FilterSpec`], a list of
//! typed [`Predicate`]s combined with AND. Each entity declares which
//! parameters it understands through a static [`ParamSpec`] table, and the
//! [`QueryBuilder`] interprets them under a [`FilterParseMode`].
//!
//! ```rust,ignore
//! let builder = QueryBuilder::new(FilterParseMode::Lenient);
//! let filter = builder.build(PROPERTY_FILTERS, &params)?;
//! let page = paginator.fetch(store, &filter, &Property::default_sort(), request).await?;
//! ```

use crate::core::error::{EstateResult, ValidationError};
use crate::core::field::{FieldValue, lookup_path};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A single store-level condition
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field equals the value exactly
    Equals { field: String, value: FieldValue },
    /// Numeric field within the inclusive bounds; a missing bound is open
    Range {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// String field contains the needle, ignoring case
    ContainsCi { field: String, needle: String },
    /// Any search term matches a word of the entity's text-index fields.
    ///
    /// In memory a term must equal a whole word, ignoring case. The MongoDB
    /// backend hands the query to `$text`, which also stems words (`villas`
    /// finds `villa`), skips stop words and treats `-term` as a negation, so
    /// it can match more records than the in-memory store.
    FullText { query: String },
    /// Boolean field is `true`
    BooleanFlag { field: String },
}

impl Predicate {
    /// Evaluate against a serialized record
    pub fn matches(&self, record: &Value, text_fields: &[&str]) -> bool {
        match self {
            Predicate::Equals { field, value } => lookup_path(record, field)
                .map(|v| value.matches_json(v))
                .unwrap_or(false),
            Predicate::Range { field, min, max } => {
                let Some(n) = lookup_path(record, field).and_then(Value::as_f64) else {
                    return false;
                };
                min.is_none_or(|m| n >= m) && max.is_none_or(|m| n <= m)
            }
            Predicate::ContainsCi { field, needle } => lookup_path(record, field)
                .and_then(Value::as_str)
                .map(|s| s.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false),
            Predicate::FullText { query } => {
                let terms = search_terms(query);
                !terms.is_empty()
                    && text_fields.iter().any(|field| {
                        lookup_path(record, field)
                            .and_then(Value::as_str)
                            .map(|text| {
                                search_terms(text)
                                    .iter()
                                    .any(|word| terms.contains(word))
                            })
                            .unwrap_or(false)
                    })
            }
            Predicate::BooleanFlag { field } => {
                matches!(lookup_path(record, field), Some(Value::Bool(true)))
            }
        }
    }
}

/// Lowercased alphanumeric words of a text
pub fn search_terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// AND-combination of predicates; empty matches everything
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSpec {
    predicates: Vec<Predicate>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn equals(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::new().and(Predicate::Equals {
            field: field.to_string(),
            value: value.into(),
        })
    }

    /// Restrict to records whose flag field is `true`
    pub fn flagged(mut self, field: &str) -> Self {
        self.predicates.push(Predicate::BooleanFlag {
            field: field.to_string(),
        });
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, record: &Value, text_fields: &[&str]) -> bool {
        self.predicates.iter().all(|p| p.matches(record, text_fields))
    }
}

/// How malformed filter parameters are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterParseMode {
    /// Malformed values are dropped as if absent
    #[default]
    Lenient,
    /// Malformed values are rejected with a validation error
    Strict,
}

impl std::str::FromStr for FilterParseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(FilterParseMode::Lenient),
            "strict" => Ok(FilterParseMode::Strict),
            other => Err(format!("unknown filter mode '{}'", other)),
        }
    }
}

/// How one query parameter maps onto a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRule {
    FullText,
    Equals(&'static str),
    Min(&'static str),
    Max(&'static str),
    ContainsCi(&'static str),
    Flag(&'static str),
}

/// A query parameter an entity listing understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub param: &'static str,
    pub rule: ParamRule,
}

impl ParamSpec {
    pub const fn new(param: &'static str, rule: ParamRule) -> Self {
        Self { param, rule }
    }
}

/// Turns raw parameters into a [`FilterSpec`]. Holds no mutable state.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder {
    mode: FilterParseMode,
}

impl QueryBuilder {
    pub fn new(mode: FilterParseMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> FilterParseMode {
        self.mode
    }

    /// Build the filter for `params` according to `schema`.
    ///
    /// Parameters not in the schema are ignored, as are empty values.
    /// Min/max parameters targeting the same field merge into one range.
    pub fn build(
        &self,
        schema: &[ParamSpec],
        params: &HashMap<String, String>,
    ) -> EstateResult<FilterSpec> {
        let mut filter = FilterSpec::new();
        let mut ranges: IndexMap<&'static str, (Option<f64>, Option<f64>)> = IndexMap::new();

        for spec in schema {
            let Some(raw) = params.get(spec.param).map(|v| v.trim()) else {
                continue;
            };
            if raw.is_empty() {
                continue;
            }

            match spec.rule {
                ParamRule::FullText => filter.push(Predicate::FullText {
                    query: raw.to_string(),
                }),
                ParamRule::Equals(field) => filter.push(Predicate::Equals {
                    field: field.to_string(),
                    value: FieldValue::String(raw.to_string()),
                }),
                ParamRule::ContainsCi(field) => filter.push(Predicate::ContainsCi {
                    field: field.to_string(),
                    needle: raw.to_string(),
                }),
                ParamRule::Min(field) => {
                    if let Some(n) = self.parse_number(spec.param, raw)? {
                        ranges.entry(field).or_default().0 = Some(n);
                    }
                }
                ParamRule::Max(field) => {
                    if let Some(n) = self.parse_number(spec.param, raw)? {
                        ranges.entry(field).or_default().1 = Some(n);
                    }
                }
                ParamRule::Flag(field) => {
                    if raw == "true" {
                        filter.push(Predicate::BooleanFlag {
                            field: field.to_string(),
                        });
                    } else if raw != "false" && self.mode == FilterParseMode::Strict {
                        return Err(ValidationError::field(
                            spec.param,
                            format!("expected 'true' or 'false', got '{}'", raw),
                        )
                        .into());
                    }
                }
            }
        }

        for (field, (min, max)) in ranges {
            filter.push(Predicate::Range {
                field: field.to_string(),
                min,
                max,
            });
        }

        Ok(filter)
    }

    fn parse_number(&self, param: &str, raw: &str) -> EstateResult<Option<f64>> {
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Some(n)),
            _ => match self.mode {
                FilterParseMode::Lenient => {
                    tracing::debug!(param, value = raw, "ignoring malformed numeric filter");
                    Ok(None)
                }
                FilterParseMode::Strict => Err(ValidationError::field(
                    param,
                    format!("expected a number, got '{}'", raw),
                )
                .into()),
            },
        }
    }
}
