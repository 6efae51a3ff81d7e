//! Deadline decorator for entity stores

use crate::core::entity::Entity;
use crate::core::error::EstateResult;
use crate::core::filter::FilterSpec;
use crate::core::query::SortOrder;
use crate::core::store::{EntityStore, with_deadline};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Wraps a store so every call fails with `DeadlineExceeded` after `timeout`
pub struct TimedStore<T> {
    inner: Arc<dyn EntityStore<T>>,
    timeout: Duration,
}

impl<T: Entity> TimedStore<T> {
    pub fn new(inner: Arc<dyn EntityStore<T>>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    fn label(operation: &str) -> String {
        format!("{} {}", operation, T::resource_name())
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for TimedStore<T> {
    async fn create(&self, entity: T) -> EstateResult<T> {
        with_deadline(Some(self.timeout), &Self::label("create"), self.inner.create(entity)).await
    }

    async fn find_by_id(&self, id: &Uuid) -> EstateResult<Option<T>> {
        with_deadline(Some(self.timeout), &Self::label("find"), self.inner.find_by_id(id)).await
    }

    async fn find(
        &self,
        filter: &FilterSpec,
        sort: &SortOrder,
        skip: u64,
        limit: Option<u64>,
    ) -> EstateResult<Vec<T>> {
        with_deadline(
            Some(self.timeout),
            &Self::label("find"),
            self.inner.find(filter, sort, skip, limit),
        )
        .await
    }

    async fn count(&self, filter: &FilterSpec) -> EstateResult<u64> {
        with_deadline(Some(self.timeout), &Self::label("count"), self.inner.count(filter)).await
    }

    async fn update_by_id(&self, id: &Uuid, patch: Map<String, Value>) -> EstateResult<Option<T>> {
        with_deadline(
            Some(self.timeout),
            &Self::label("update"),
            self.inner.update_by_id(id, patch),
        )
        .await
    }

    async fn delete_by_id(&self, id: &Uuid) -> EstateResult<bool> {
        with_deadline(Some(self.timeout), &Self::label("delete"), self.inner.delete_by_id(id)).await
    }

    async fn distinct_values(&self, field: &str) -> EstateResult<Vec<Value>> {
        with_deadline(
            Some(self.timeout),
            &Self::label("distinct"),
            self.inner.distinct_values(field),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::EstateError;
    use crate::entities::Blog;

    struct SlowStore;

    #[async_trait]
    impl EntityStore<Blog> for SlowStore {
        async fn create(&self, entity: Blog) -> EstateResult<Blog> {
            Ok(entity)
        }
        async fn find_by_id(&self, _id: &Uuid) -> EstateResult<Option<Blog>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }
        async fn find(&self, _: &FilterSpec, _: &SortOrder, _: u64, _: Option<u64>) -> EstateResult<Vec<Blog>> {
            Ok(vec![])
        }
        async fn count(&self, _: &FilterSpec) -> EstateResult<u64> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(0)
        }
        async fn update_by_id(&self, _: &Uuid, _: Map<String, Value>) -> EstateResult<Option<Blog>> {
            Ok(None)
        }
        async fn delete_by_id(&self, _: &Uuid) -> EstateResult<bool> {
            Ok(false)
        }
        async fn distinct_values(&self, _: &str) -> EstateResult<Vec<Value>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_slow_calls_exceed_deadline() {
        let store = TimedStore::new(Arc::new(SlowStore), Duration::from_millis(20));

        let err = store.find_by_id(&Uuid::new_v4()).await.unwrap_err();
        match err {
            EstateError::DeadlineExceeded { operation, timeout_ms } => {
                assert_eq!(operation, "find blogs");
                assert_eq!(timeout_ms, 20);
            }
            other => panic!("expected deadline error, got {:?}", other),
        }

        assert!(store.find(&FilterSpec::new(), &SortOrder::new(), 0, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_paginator_surfaces_count_deadline() {
        use crate::core::query::{PageRequest, Paginator};

        let store = TimedStore::new(Arc::new(SlowStore), Duration::from_millis(20));
        let err = Paginator::new()
            .fetch::<Blog>(&store, &FilterSpec::new(), &SortOrder::newest_first(), PageRequest::new(1, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, EstateError::DeadlineExceeded { .. }));
    }
}
