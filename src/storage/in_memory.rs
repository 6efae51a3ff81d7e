//! In-memory implementation of EntityStore for testing and development

use crate::core::entity::{Entity, timestamp};
use crate::core::error::{EntityError, EstateResult, StorageError, ValidationError};
use crate::core::field::lookup_path;
use crate::core::filter::FilterSpec;
use crate::core::query::SortOrder;
use crate::core::store::{EntityStore, sanitize_patch};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

const BACKEND: &str = "memory";

/// In-memory entity store
///
/// Records are kept typed and serialized on demand for filtering and
/// sorting. Unique fields are enforced on create and update. Cloning shares
/// the underlying map.
#[derive(Clone)]
pub struct InMemoryStore<T> {
    records: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Entity> InMemoryStore<T> {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn to_json(entity: &T) -> EstateResult<Value> {
        serde_json::to_value(entity).map_err(|e| {
            StorageError::Corrupt {
                entity_type: T::resource_name_singular().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    fn from_json(json: Value) -> EstateResult<T> {
        serde_json::from_value(json).map_err(|e| {
            StorageError::Corrupt {
                entity_type: T::resource_name_singular().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Serialized records matching `filter`, sorted
    fn select(records: &HashMap<Uuid, T>, filter: &FilterSpec, sort: &SortOrder) -> EstateResult<Vec<(Value, T)>> {
        let text_fields = T::text_index_fields();
        let mut selected = Vec::new();
        for entity in records.values() {
            let json = Self::to_json(entity)?;
            if filter.matches(&json, text_fields) {
                selected.push((json, entity.clone()));
            }
        }
        selected.sort_by(|(a, _), (b, _)| sort.compare(a, b));
        Ok(selected)
    }

    fn check_unique(records: &HashMap<Uuid, T>, candidate: &Value, own_id: Uuid) -> EstateResult<()> {
        for field in T::unique_fields() {
            let Some(value) = lookup_path(candidate, field).filter(|v| !v.is_null()) else {
                continue;
            };
            for (id, other) in records.iter() {
                if *id == own_id {
                    continue;
                }
                let other = Self::to_json(other)?;
                if lookup_path(&other, field) == Some(value) {
                    let shown = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
                    return Err(EntityError::duplicate(T::display_name(), field, shown).into());
                }
            }
        }
        Ok(())
    }
}

impl<T: Entity> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for InMemoryStore<T> {
    async fn create(&self, entity: T) -> EstateResult<T> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StorageError::unavailable(BACKEND, format!("Failed to acquire write lock: {}", e)))?;

        if records.contains_key(&entity.id()) {
            return Err(EntityError::duplicate(T::display_name(), "id", entity.id()).into());
        }
        let json = Self::to_json(&entity)?;
        Self::check_unique(&records, &json, entity.id())?;

        // keep what a document store would hand back (millisecond timestamps)
        let stored = Self::from_json(json)?;
        records.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: &Uuid) -> EstateResult<Option<T>> {
        let records = self
            .records
            .read()
            .map_err(|e| StorageError::unavailable(BACKEND, format!("Failed to acquire read lock: {}", e)))?;

        Ok(records.get(id).cloned())
    }

    async fn find(
        &self,
        filter: &FilterSpec,
        sort: &SortOrder,
        skip: u64,
        limit: Option<u64>,
    ) -> EstateResult<Vec<T>> {
        let records = self
            .records
            .read()
            .map_err(|e| StorageError::unavailable(BACKEND, format!("Failed to acquire read lock: {}", e)))?;

        let selected = Self::select(&records, filter, sort)?;
        let window = selected
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(limit.map(|l| usize::try_from(l).unwrap_or(usize::MAX)).unwrap_or(usize::MAX))
            .map(|(_, entity)| entity)
            .collect();
        Ok(window)
    }

    async fn count(&self, filter: &FilterSpec) -> EstateResult<u64> {
        let records = self
            .records
            .read()
            .map_err(|e| StorageError::unavailable(BACKEND, format!("Failed to acquire read lock: {}", e)))?;

        let text_fields = T::text_index_fields();
        let mut total = 0;
        for entity in records.values() {
            if filter.matches(&Self::to_json(entity)?, text_fields) {
                total += 1;
            }
        }
        Ok(total)
    }

    async fn update_by_id(&self, id: &Uuid, patch: Map<String, Value>) -> EstateResult<Option<T>> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StorageError::unavailable(BACKEND, format!("Failed to acquire write lock: {}", e)))?;

        let Some(existing) = records.get(id) else {
            return Ok(None);
        };

        let mut json = Self::to_json(existing)?;
        if let Value::Object(fields) = &mut json {
            fields.extend(sanitize_patch(patch));
            fields.insert("updatedAt".to_string(), Value::String(timestamp::now_string()));
        }

        let updated: T = serde_json::from_value(json.clone()).map_err(|e| ValidationError::InvalidJson {
            message: e.to_string(),
        })?;
        Self::check_unique(&records, &json, *id)?;

        records.insert(*id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_by_id(&self, id: &Uuid) -> EstateResult<bool> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StorageError::unavailable(BACKEND, format!("Failed to acquire write lock: {}", e)))?;

        Ok(records.remove(id).is_some())
    }

    async fn distinct_values(&self, field: &str) -> EstateResult<Vec<Value>> {
        let records = self
            .records
            .read()
            .map_err(|e| StorageError::unavailable(BACKEND, format!("Failed to acquire read lock: {}", e)))?;

        let mut values: Vec<Value> = Vec::new();
        for entity in records.values() {
            let json = Self::to_json(entity)?;
            if let Some(v) = lookup_path(&json, field).filter(|v| !v.is_null())
                && !values.contains(v)
            {
                values.push(v.clone());
            }
        }
        values.sort_by_key(|v| v.to_string());
        Ok(values)
    }
}
