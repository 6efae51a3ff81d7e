//! Entity trait describing how a record type is stored, searched and sorted

use crate::core::query::SortOrder;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Base trait for every stored record type.
///
/// Records are serialized to JSON documents (camelCase keys) for storage and
/// filtering, so field paths used by filters, indexes and sort keys are the
/// serialized names (`address.city`, `isFeatured`, `createdAt`).
///
/// Implementations are normally generated with [`impl_entity!`](crate::impl_entity).
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Plural resource name, used for collection names and URLs (e.g. "properties")
    fn resource_name() -> &'static str;

    /// Singular resource name (e.g. "property")
    fn resource_name_singular() -> &'static str;

    /// Human-readable name used in error messages (e.g. "team member")
    fn display_name() -> &'static str {
        Self::resource_name_singular()
    }

    /// Get the unique identifier for this record
    fn id(&self) -> Uuid;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Get the last update timestamp
    fn updated_at(&self) -> DateTime<Utc>;

    /// Fields covered by the full-text index
    fn text_index_fields() -> &'static [&'static str] {
        &[]
    }

    /// Fields whose values must be unique across the collection
    fn unique_fields() -> &'static [&'static str] {
        &[]
    }

    /// Soft "active" flag bounding unfiltered listings, if the type has one
    fn active_flag() -> Option<&'static str> {
        None
    }

    /// Default listing order
    fn default_sort() -> SortOrder {
        SortOrder::newest_first()
    }
}

/// Serde adapter writing timestamps with fixed millisecond precision.
///
/// Fixed-width RFC 3339 strings sort lexicographically in time order, which
/// both the in-memory and the document backends rely on.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }

    /// Current time at stored precision. Records built from it compare
    /// equal to their own stored copy.
    pub fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(3)
    }

    /// Current time in the stored representation
    pub fn now_string() -> String {
        now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
