//! MongoDB entity store using the official async driver.
//!
//! Gated behind the `mongodb_backend` feature:
//! ```toml
//! estate-rs = { version = "0.1", features = ["mongodb_backend"] }
//! ```
//!
//! # Storage model
//!
//! One collection per record type, named by `T::resource_name()`
//! ("properties", "team-members", ...). Records go through
//! `serde_json::Value` on their way to BSON, so ids are stored as strings,
//! timestamps as fixed-width RFC 3339 strings, and `id` is renamed to `_id`.
//!
//! [`MongoStore::ensure_indexes`] creates the text index over the type's
//! text-index fields and a unique index per unique field.

use crate::core::entity::{Entity, timestamp};
use crate::core::error::{EntityError, EstateError, EstateResult, StorageError, ValidationError};
use crate::core::field::FieldValue;
use crate::core::filter::{FilterSpec, Predicate};
use crate::core::query::{SortDirection, SortOrder};
use crate::core::store::{EntityStore, sanitize_patch};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Database, IndexModel};
use serde_json::{Map, Value};
use uuid::Uuid;

const BACKEND: &str = "mongodb";

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a JSON object into a BSON document, renaming `id` → `_id`.
fn json_to_document(json: Value) -> EstateResult<Document> {
    let bson_val = mongodb::bson::to_bson(&json).map_err(|e| StorageError::QueryError {
        backend: BACKEND.to_string(),
        message: format!("Failed to convert JSON to BSON: {}", e),
    })?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => {
            return Err(StorageError::QueryError {
                backend: BACKEND.to_string(),
                message: "Expected BSON document, got non-object".to_string(),
            }
            .into());
        }
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

/// Convert a BSON document back into JSON, renaming `_id` → `id`.
fn document_to_json(mut doc: Document) -> Value {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    Bson::Document(doc).into_relaxed_extjson()
}

fn id_bson(id: &Uuid) -> Bson {
    Bson::String(id.to_string())
}

fn field_value_bson(value: &FieldValue) -> Bson {
    match value {
        FieldValue::String(s) => Bson::String(s.clone()),
        FieldValue::Integer(i) => Bson::Int64(*i),
        FieldValue::Float(f) => Bson::Double(*f),
        FieldValue::Boolean(b) => Bson::Boolean(*b),
        FieldValue::Null => Bson::Null,
    }
}

/// Translate a filter into a MongoDB query document
pub fn filter_to_document(filter: &FilterSpec) -> Document {
    let clauses: Vec<Document> = filter
        .predicates()
        .iter()
        .map(|predicate| match predicate {
            Predicate::Equals { field, value } => doc! { field.as_str(): field_value_bson(value) },
            Predicate::Range { field, min, max } => {
                let mut bounds = Document::new();
                if let Some(min) = min {
                    bounds.insert("$gte", *min);
                }
                if let Some(max) = max {
                    bounds.insert("$lte", *max);
                }
                doc! { field.as_str(): bounds }
            }
            Predicate::ContainsCi { field, needle } => doc! {
                field.as_str(): { "$regex": regex::escape(needle), "$options": "i" }
            },
            Predicate::FullText { query } => doc! { "$text": { "$search": query.as_str() } },
            Predicate::BooleanFlag { field } => doc! { field.as_str(): true },
        })
        .collect();

    match clauses.len() {
        0 => Document::new(),
        1 => clauses.into_iter().next().unwrap_or_default(),
        _ => doc! { "$and": clauses },
    }
}

/// Translate a sort order, appending the `_id` tiebreak
pub fn sort_to_document(sort: &SortOrder) -> Document {
    let mut doc = Document::new();
    for key in sort.keys() {
        let direction = match key.direction {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        };
        doc.insert(key.field.clone(), direction);
    }
    doc.insert("_id", 1);
    doc
}

fn map_driver_error(context: &str, err: mongodb::error::Error) -> EstateError {
    let message = format!("{}: {}", context, err);
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::ConnectionPoolCleared { .. } => {
            StorageError::Unavailable {
                backend: BACKEND.to_string(),
                message,
            }
            .into()
        }
        _ => StorageError::QueryError {
            backend: BACKEND.to_string(),
            message,
        }
        .into(),
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == 11000,
        ErrorKind::Command(e) => e.code == 11000,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// MongoStore<T>
// ---------------------------------------------------------------------------

/// Entity store backed by one MongoDB collection.
///
/// # Example
///
/// ```rust,ignore
/// use mongodb::Client;
/// use estate::storage::MongoStore;
///
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let store = MongoStore::<Property>::new(client.database("estate"));
/// store.ensure_indexes().await?;
/// ```
#[derive(Clone, Debug)]
pub struct MongoStore<T> {
    database: Database,
    _marker: std::marker::PhantomData<T>,
}

impl<T> MongoStore<T> {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl<T: Entity> MongoStore<T> {
    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection(T::resource_name())
    }

    fn entity_to_document(entity: &T) -> EstateResult<Document> {
        let json = serde_json::to_value(entity)?;
        json_to_document(json)
    }

    fn document_to_entity(doc: Document) -> EstateResult<T> {
        serde_json::from_value(document_to_json(doc)).map_err(|e| {
            StorageError::Corrupt {
                entity_type: T::resource_name_singular().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    fn duplicate_error(err: &mongodb::error::Error, fallback: &str) -> EstateError {
        let message = err.to_string();
        let field = T::unique_fields()
            .iter()
            .find(|f| message.contains(&format!("{}_1", f)))
            .copied()
            .unwrap_or(fallback);
        EntityError::duplicate(T::display_name(), field, "").into()
    }

    /// Create the text index and unique indexes. Idempotent.
    pub async fn ensure_indexes(&self) -> EstateResult<()> {
        let mut indexes = Vec::new();

        let text_fields = T::text_index_fields();
        if !text_fields.is_empty() {
            let mut keys = Document::new();
            for field in text_fields {
                keys.insert(*field, "text");
            }
            indexes.push(IndexModel::builder().keys(keys).build());
        }

        for field in T::unique_fields() {
            indexes.push(
                IndexModel::builder()
                    .keys(doc! { *field: 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            );
        }

        indexes.push(IndexModel::builder().keys(doc! { "createdAt": -1 }).build());

        self.collection()
            .create_indexes(indexes)
            .await
            .map_err(|e| map_driver_error(&format!("Failed to create indexes on {}", T::resource_name()), e))?;

        tracing::info!(collection = T::resource_name(), "indexes ensured");
        Ok(())
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for MongoStore<T> {
    async fn create(&self, entity: T) -> EstateResult<T> {
        let doc = Self::entity_to_document(&entity)?;

        match self.collection().insert_one(doc).await {
            Ok(_) => Ok(entity),
            Err(e) if is_duplicate_key(&e) => Err(Self::duplicate_error(&e, "id")),
            Err(e) => Err(map_driver_error("Failed to create record", e)),
        }
    }

    async fn find_by_id(&self, id: &Uuid) -> EstateResult<Option<T>> {
        let doc = self
            .collection()
            .find_one(doc! { "_id": id_bson(id) })
            .await
            .map_err(|e| map_driver_error("Failed to get record", e))?;

        doc.map(Self::document_to_entity).transpose()
    }

    async fn find(
        &self,
        filter: &FilterSpec,
        sort: &SortOrder,
        skip: u64,
        limit: Option<u64>,
    ) -> EstateResult<Vec<T>> {
        // The server rejects skips that do not fit an i64; no page starts that far out
        if i64::try_from(skip).is_err() {
            return Ok(Vec::new());
        }

        let mut action = self
            .collection()
            .find(filter_to_document(filter))
            .sort(sort_to_document(sort))
            .skip(skip);
        if let Some(limit) = limit {
            action = action.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let cursor = action
            .await
            .map_err(|e| map_driver_error("Failed to list records", e))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| map_driver_error("Failed to collect records", e))?;

        docs.into_iter().map(Self::document_to_entity).collect()
    }

    async fn count(&self, filter: &FilterSpec) -> EstateResult<u64> {
        self.collection()
            .count_documents(filter_to_document(filter))
            .await
            .map_err(|e| map_driver_error("Failed to count records", e))
    }

    async fn update_by_id(&self, id: &Uuid, patch: Map<String, Value>) -> EstateResult<Option<T>> {
        let Some(existing) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut changes = sanitize_patch(patch);
        changes.insert("updatedAt".to_string(), Value::String(timestamp::now_string()));

        // reject patches that would not deserialize before writing them
        let mut merged = serde_json::to_value(&existing)?;
        if let Value::Object(fields) = &mut merged {
            fields.extend(changes.clone());
        }
        serde_json::from_value::<T>(merged).map_err(|e| ValidationError::InvalidJson {
            message: e.to_string(),
        })?;

        let set = json_to_document(Value::Object(changes))?;
        let updated = self
            .collection()
            .find_one_and_update(doc! { "_id": id_bson(id) }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await;

        match updated {
            Ok(doc) => doc.map(Self::document_to_entity).transpose(),
            Err(e) if is_duplicate_key(&e) => Err(Self::duplicate_error(&e, "id")),
            Err(e) => Err(map_driver_error("Failed to update record", e)),
        }
    }

    async fn delete_by_id(&self, id: &Uuid) -> EstateResult<bool> {
        let result = self
            .collection()
            .delete_one(doc! { "_id": id_bson(id) })
            .await
            .map_err(|e| map_driver_error("Failed to delete record", e))?;

        Ok(result.deleted_count > 0)
    }

    async fn distinct_values(&self, field: &str) -> EstateResult<Vec<Value>> {
        let values = self
            .collection()
            .distinct(field, doc! {})
            .await
            .map_err(|e| map_driver_error("Failed to read distinct values", e))?;

        let mut values: Vec<Value> = values
            .into_iter()
            .filter(|v| !matches!(v, Bson::Null))
            .map(Bson::into_relaxed_extjson)
            .collect();
        values.sort_by_key(|v| v.to_string());
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_to_document_renames_id_to_underscore_id() {
        let doc = json_to_document(json!({"id": "abc", "title": "Villa"})).unwrap();
        assert_eq!(doc.get_str("_id").unwrap(), "abc");
        assert!(doc.get("id").is_none());
    }

    #[test]
    fn json_to_document_non_object_returns_error() {
        assert!(json_to_document(json!([1, 2])).is_err());
    }

    #[test]
    fn document_to_json_renames_underscore_id_to_id() {
        let json = document_to_json(doc! { "_id": "abc", "address": { "city": "Pune" } });
        assert_eq!(json["id"], "abc");
        assert_eq!(json["address"]["city"], "Pune");
    }

    #[test]
    fn empty_filter_is_empty_document() {
        assert!(filter_to_document(&FilterSpec::new()).is_empty());
    }

    #[test]
    fn single_predicate_is_not_wrapped() {
        let filter = FilterSpec::new().flagged("isActive");
        assert_eq!(filter_to_document(&filter), doc! { "isActive": true });
    }

    #[test]
    fn predicates_translate_under_and() {
        let filter = FilterSpec::new()
            .and(Predicate::Range {
                field: "price".into(),
                min: Some(100.0),
                max: None,
            })
            .and(Predicate::ContainsCi {
                field: "address.city".into(),
                needle: "a.b".into(),
            })
            .and(Predicate::FullText {
                query: "villa".into(),
            });

        assert_eq!(
            filter_to_document(&filter),
            doc! { "$and": [
                { "price": { "$gte": 100.0 } },
                { "address.city": { "$regex": "a\\.b", "$options": "i" } },
                { "$text": { "$search": "villa" } },
            ] }
        );
    }

    #[test]
    fn sort_appends_id_tiebreak() {
        let sort = SortOrder::new().descending("isFeatured").descending("createdAt");
        assert_eq!(
            sort_to_document(&sort),
            doc! { "isFeatured": -1, "createdAt": -1, "_id": 1 }
        );
    }
}
