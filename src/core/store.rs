//! Entity store contract
//!
//! One store per record type, backed by one collection. Implementations live
//! in [`crate::storage`]; handlers only ever see `Arc<dyn EntityStore<T>>`.

use crate::core::entity::Entity;
use crate::core::error::{EstateError, EstateResult};
use crate::core::filter::FilterSpec;
use crate::core::query::SortOrder;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

/// Persistence contract for one record type.
///
/// All reads are point-in-time; no operation spans more than one document
/// except `find`, `count` and `distinct_values`, which are not isolated from
/// concurrent writes.
#[async_trait]
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Insert a new record. Fails with `Duplicate` if a unique field clashes.
    async fn create(&self, entity: T) -> EstateResult<T>;

    /// Fetch a record by id
    async fn find_by_id(&self, id: &Uuid) -> EstateResult<Option<T>>;

    /// Sorted window of records matching `filter`; `limit: None` means all
    async fn find(
        &self,
        filter: &FilterSpec,
        sort: &SortOrder,
        skip: u64,
        limit: Option<u64>,
    ) -> EstateResult<Vec<T>>;

    /// Number of records matching `filter`
    async fn count(&self, filter: &FilterSpec) -> EstateResult<u64>;

    /// Apply a partial update (top-level fields) and return the new state.
    ///
    /// `id` and `createdAt` in the patch are ignored; `updatedAt` is bumped.
    /// Returns `None` when no record has this id.
    async fn update_by_id(&self, id: &Uuid, patch: Map<String, Value>) -> EstateResult<Option<T>>;

    /// Hard delete; `false` when nothing was deleted
    async fn delete_by_id(&self, id: &Uuid) -> EstateResult<bool>;

    /// Distinct values of a field across the collection
    async fn distinct_values(&self, field: &str) -> EstateResult<Vec<Value>>;

    /// First record matching `filter` in default order
    async fn find_one(&self, filter: &FilterSpec) -> EstateResult<Option<T>> {
        let mut found = self.find(filter, &T::default_sort(), 0, Some(1)).await?;
        Ok(found.pop())
    }
}

/// Remove fields a partial update must never touch
pub fn sanitize_patch(mut patch: Map<String, Value>) -> Map<String, Value> {
    for key in ["id", "_id", "createdAt", "updatedAt"] {
        patch.remove(key);
    }
    patch
}

/// Await `fut`, failing with `DeadlineExceeded` once `timeout` elapses
pub async fn with_deadline<F, T>(
    timeout: Option<Duration>,
    operation: &str,
    fut: F,
) -> EstateResult<T>
where
    F: Future<Output = EstateResult<T>>,
{
    match timeout {
        None => fut.await,
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, timeout_ms = limit.as_millis() as u64, "deadline exceeded");
                Err(EstateError::DeadlineExceeded {
                    operation: operation.to_string(),
                    timeout_ms: limit.as_millis() as u64,
                })
            }
        },
    }
}
