//! Request payload filtering and validation
//!
//! Payload types declare field filters (trim, case folding) that run on the
//! raw JSON before deserialization; `validator` rules run afterwards. The
//! [`Validated`] extractor chains both.

pub mod extractor;
pub mod filters;

pub use extractor::Validated;
pub use filters::FieldFilter;

use serde::de::DeserializeOwned;
use validator::Validate;

/// A request body type accepted by [`Validated`]
pub trait Payload: DeserializeOwned + Validate {
    /// Filters applied to the raw body, by dotted field path
    const FILTERS: &'static [(&'static str, FieldFilter)] = &[];
}
