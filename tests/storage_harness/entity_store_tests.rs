//! Macro-generated test suite for `EntityStore<TestListing>` contract validation.
//!
//! The `entity_store_tests!` macro generates a test module that validates any
//! `EntityStore<TestListing>` implementation against the full contract: CRUD,
//! uniqueness, every predicate kind, ordering, windows and counts.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use estate::storage::InMemoryStore;
//!
//! entity_store_tests!(InMemoryStore::<TestListing>::new());
//! ```
//!
//! # Generated Tests
//!
//! ## CRUD
//! - `test_create_and_find_by_id`
//! - `test_find_by_id_missing`
//! - `test_update_merges_patch`
//! - `test_update_ignores_identity_fields`
//! - `test_update_missing_returns_none`
//! - `test_delete_existing_and_missing`
//!
//! ## Uniqueness
//! - `test_create_duplicate_unique_field`
//! - `test_update_into_duplicate_unique_field`
//!
//! ## Filters
//! - `test_filter_equals`, `test_filter_range`, `test_filter_contains_nested`,
//!   `test_filter_full_text`, `test_filter_boolean_flag`, `test_filters_combine`
//!
//! ## Ordering and windows
//! - `test_default_sort_featured_then_newest`
//! - `test_pages_are_disjoint_and_complete`
//! - `test_paginator_metadata`
//!
//! ## Misc
//! - `test_distinct_values`, `test_find_one`, `test_concurrent_creates`

/// Generate a full `EntityStore<TestListing>` conformance test suite.
///
/// `$factory` must evaluate to a fresh, empty store implementing
/// `EntityStore<TestListing> + Clone + 'static`. It is re-evaluated for each
/// test to ensure isolation.
#[macro_export]
macro_rules! entity_store_tests {
    ($factory:expr) => {
        mod entity_store_contract_tests {
            use super::*;
            use estate::core::entity::Entity;
            use estate::core::error::{EntityError, EstateError};
            use estate::core::filter::{FilterSpec, Predicate};
            use estate::core::query::{PageRequest, Paginator, SortOrder};
            use estate::core::store::EntityStore;
            use serde_json::{Map, Value, json};
            use uuid::Uuid;

            fn patch(value: Value) -> Map<String, Value> {
                match value {
                    Value::Object(map) => map,
                    _ => panic!("patch must be an object"),
                }
            }

            async fn seeded() -> impl EntityStore<TestListing> + Clone + 'static {
                let store = $factory;
                let mut villa = listing_at("V1", "Garden villa", 250_000.0, "Pune", 1);
                villa.is_featured = true;
                villa.category = Some("luxury".to_string());
                let mut flat = listing_at("F1", "City flat", 90_000.0, "Mumbai", 2);
                flat.category = Some("budget".to_string());
                let mut plot = listing_at("P1", "Open plot", 40_000.0, "Navi Mumbai", 3);
                plot.is_active = false;
                plot.kind = "Land".to_string();
                for record in [villa, flat, plot] {
                    store.create(record).await.unwrap();
                }
                store
            }

            fn codes(items: &[TestListing]) -> Vec<&str> {
                items.iter().map(|l| l.code.as_str()).collect()
            }

            async fn find_all(
                store: &impl EntityStore<TestListing>,
                filter: &FilterSpec,
            ) -> Vec<TestListing> {
                store
                    .find(filter, &TestListing::default_sort(), 0, None)
                    .await
                    .unwrap()
            }

            // ==================================================================
            // CRUD
            // ==================================================================

            #[tokio::test]
            async fn test_create_and_find_by_id() {
                let store = $factory;
                let record = listing("A1", "Sea view apartment", 120_000.0, "Goa");
                let id = record.id;

                let created = store.create(record.clone()).await.unwrap();
                assert_eq!(created, record);

                let found = store.find_by_id(&id).await.unwrap();
                assert_eq!(found, Some(record));
            }

            #[tokio::test]
            async fn test_find_by_id_missing() {
                let store = $factory;
                assert!(store.find_by_id(&Uuid::new_v4()).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_update_merges_patch() {
                let store = $factory;
                let record = store
                    .create(listing("A1", "Sea view apartment", 120_000.0, "Goa"))
                    .await
                    .unwrap();

                let updated = store
                    .update_by_id(&record.id, patch(json!({"price": 99_000.0, "isFeatured": true})))
                    .await
                    .unwrap()
                    .expect("record exists");

                assert_eq!(updated.price, 99_000.0);
                assert!(updated.is_featured);
                assert_eq!(updated.title, record.title);
                assert!(updated.updated_at >= record.updated_at);

                let reloaded = store.find_by_id(&record.id).await.unwrap().unwrap();
                assert_eq!(reloaded.price, 99_000.0);
            }

            #[tokio::test]
            async fn test_update_ignores_identity_fields() {
                let store = $factory;
                let record = store
                    .create(listing("A1", "Sea view apartment", 120_000.0, "Goa"))
                    .await
                    .unwrap();

                let updated = store
                    .update_by_id(
                        &record.id,
                        patch(json!({
                            "id": Uuid::new_v4().to_string(),
                            "createdAt": "2000-01-01T00:00:00.000Z",
                            "title": "Renamed"
                        })),
                    )
                    .await
                    .unwrap()
                    .unwrap();

                assert_eq!(updated.id, record.id);
                assert_eq!(updated.created_at, record.created_at);
                assert_eq!(updated.title, "Renamed");
            }

            #[tokio::test]
            async fn test_update_missing_returns_none() {
                let store = $factory;
                let result = store
                    .update_by_id(&Uuid::new_v4(), patch(json!({"title": "x"})))
                    .await
                    .unwrap();
                assert!(result.is_none());
            }

            #[tokio::test]
            async fn test_delete_existing_and_missing() {
                let store = $factory;
                let record = store
                    .create(listing("A1", "Sea view apartment", 120_000.0, "Goa"))
                    .await
                    .unwrap();

                assert!(store.delete_by_id(&record.id).await.unwrap());
                assert!(store.find_by_id(&record.id).await.unwrap().is_none());
                assert!(!store.delete_by_id(&record.id).await.unwrap());
            }

            // ==================================================================
            // Uniqueness
            // ==================================================================

            #[tokio::test]
            async fn test_create_duplicate_unique_field() {
                let store = $factory;
                store.create(listing("DUP", "First", 1.0, "Pune")).await.unwrap();

                let err = store
                    .create(listing("DUP", "Second", 2.0, "Pune"))
                    .await
                    .unwrap_err();
                assert!(
                    matches!(err, EstateError::Entity(EntityError::Duplicate { .. })),
                    "expected duplicate error, got {:?}",
                    err
                );
                assert_eq!(store.count(&FilterSpec::new()).await.unwrap(), 1);
            }

            #[tokio::test]
            async fn test_update_into_duplicate_unique_field() {
                let store = $factory;
                store.create(listing("A", "First", 1.0, "Pune")).await.unwrap();
                let second = store.create(listing("B", "Second", 2.0, "Pune")).await.unwrap();

                let err = store
                    .update_by_id(&second.id, patch(json!({"code": "A"})))
                    .await
                    .unwrap_err();
                assert!(matches!(err, EstateError::Entity(EntityError::Duplicate { .. })));

                // Re-saving its own value is not a conflict
                let same = store
                    .update_by_id(&second.id, patch(json!({"code": "B"})))
                    .await
                    .unwrap();
                assert!(same.is_some());
            }

            // ==================================================================
            // Filters
            // ==================================================================

            #[tokio::test]
            async fn test_filter_equals() {
                let store = seeded().await;
                let found = find_all(&store, &FilterSpec::equals("kind", "Land")).await;
                assert_eq!(codes(&found), vec!["P1"]);
            }

            #[tokio::test]
            async fn test_filter_range() {
                let store = seeded().await;

                let filter = FilterSpec::new().and(Predicate::Range {
                    field: "price".to_string(),
                    min: Some(50_000.0),
                    max: Some(250_000.0),
                });
                let found = find_all(&store, &filter).await;
                let mut found = codes(&found);
                found.sort();
                assert_eq!(found, vec!["F1", "V1"]);

                let open_max = FilterSpec::new().and(Predicate::Range {
                    field: "price".to_string(),
                    min: Some(100_000.0),
                    max: None,
                });
                assert_eq!(store.count(&open_max).await.unwrap(), 1);
            }

            #[tokio::test]
            async fn test_filter_contains_nested() {
                let store = seeded().await;
                let filter = FilterSpec::new().and(Predicate::ContainsCi {
                    field: "address.city".to_string(),
                    needle: "mUmBaI".to_string(),
                });
                assert_eq!(store.count(&filter).await.unwrap(), 2);
            }

            #[tokio::test]
            async fn test_filter_full_text() {
                let store = seeded().await;

                let filter = FilterSpec::new().and(Predicate::FullText {
                    query: "garden".to_string(),
                });
                assert_eq!(codes(&find_all(&store, &filter).await), vec!["V1"]);

                // Any term may match
                let filter = FilterSpec::new().and(Predicate::FullText {
                    query: "garden plot".to_string(),
                });
                assert_eq!(store.count(&filter).await.unwrap(), 2);

                let filter = FilterSpec::new().and(Predicate::FullText {
                    query: "castle".to_string(),
                });
                assert_eq!(store.count(&filter).await.unwrap(), 0);
            }

            #[tokio::test]
            async fn test_filter_boolean_flag() {
                let store = seeded().await;
                let active = FilterSpec::new().flagged("isActive");
                assert_eq!(store.count(&active).await.unwrap(), 2);

                let featured_active = active.flagged("isFeatured");
                assert_eq!(codes(&find_all(&store, &featured_active).await), vec!["V1"]);
            }

            #[tokio::test]
            async fn test_filters_combine() {
                let store = seeded().await;
                let filter = FilterSpec::new()
                    .flagged("isActive")
                    .and(Predicate::ContainsCi {
                        field: "address.city".to_string(),
                        needle: "mumbai".to_string(),
                    })
                    .and(Predicate::Range {
                        field: "price".to_string(),
                        min: None,
                        max: Some(100_000.0),
                    });
                assert_eq!(codes(&find_all(&store, &filter).await), vec!["F1"]);
            }

            // ==================================================================
            // Ordering and windows
            // ==================================================================

            #[tokio::test]
            async fn test_default_sort_featured_then_newest() {
                let store = seeded().await;
                let all = find_all(&store, &FilterSpec::new()).await;
                assert_eq!(codes(&all), vec!["V1", "P1", "F1"]);

                let newest = store
                    .find(&FilterSpec::new(), &SortOrder::newest_first(), 0, None)
                    .await
                    .unwrap();
                assert_eq!(codes(&newest), vec!["P1", "F1", "V1"]);

                let cheapest = store
                    .find(&FilterSpec::new(), &SortOrder::new().ascending("price"), 0, Some(1))
                    .await
                    .unwrap();
                assert_eq!(codes(&cheapest), vec!["P1"]);
            }

            #[tokio::test]
            async fn test_pages_are_disjoint_and_complete() {
                let store = $factory;
                for record in numbered_listings(7) {
                    store.create(record).await.unwrap();
                }

                let sort = SortOrder::newest_first();
                let mut seen = Vec::new();
                for skip in [0, 3, 6] {
                    let window = store
                        .find(&FilterSpec::new(), &sort, skip, Some(3))
                        .await
                        .unwrap();
                    seen.extend(window.into_iter().map(|l| l.code));
                }
                assert_eq!(
                    seen,
                    vec!["L006", "L005", "L004", "L003", "L002", "L001", "L000"]
                );

                let beyond = store
                    .find(&FilterSpec::new(), &sort, 50, Some(3))
                    .await
                    .unwrap();
                assert!(beyond.is_empty());
            }

            #[tokio::test]
            async fn test_paginator_metadata() {
                let store = $factory;
                for record in numbered_listings(25) {
                    store.create(record).await.unwrap();
                }
                let paginator = Paginator::new();
                let sort = SortOrder::newest_first();

                let page = paginator
                    .fetch::<TestListing>(&store, &FilterSpec::new(), &sort, PageRequest::new(2, 10))
                    .await
                    .unwrap();
                assert_eq!(page.items.len(), 10);
                assert_eq!(page.total(), 25);
                assert_eq!(page.total_pages(), 3);
                assert_eq!(page.items[0].code, "L014");

                let last = paginator
                    .fetch::<TestListing>(&store, &FilterSpec::new(), &sort, PageRequest::new(3, 10))
                    .await
                    .unwrap();
                assert_eq!(last.items.len(), 5);

                let empty = paginator
                    .fetch::<TestListing>(&store, &FilterSpec::equals("code", "nope"), &sort, PageRequest::new(1, 10))
                    .await
                    .unwrap();
                assert_eq!(empty.total(), 0);
                assert_eq!(empty.total_pages(), 0);
            }

            #[tokio::test]
            async fn test_skip_beyond_every_record() {
                let store = seeded().await;
                let sort = SortOrder::newest_first();

                let found = store
                    .find(&FilterSpec::new(), &sort, u64::MAX, Some(10))
                    .await
                    .unwrap();
                assert!(found.is_empty());

                let page = Paginator::new()
                    .fetch::<TestListing>(&store, &FilterSpec::new(), &sort, PageRequest::new(u64::MAX, 10))
                    .await
                    .unwrap();
                assert!(page.items.is_empty());
                assert_eq!(page.total(), 3);
                assert_eq!(page.total_pages(), 1);
            }

            // ==================================================================
            // Misc
            // ==================================================================

            #[tokio::test]
            async fn test_distinct_values() {
                let store = seeded().await;
                let mut values: Vec<String> = store
                    .distinct_values("category")
                    .await
                    .unwrap()
                    .into_iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect();
                values.sort();
                assert_eq!(values, vec!["budget", "luxury"]);
            }

            #[tokio::test]
            async fn test_find_one() {
                let store = seeded().await;
                let found = store.find_one(&FilterSpec::equals("code", "F1")).await.unwrap();
                assert_eq!(found.map(|l| l.title), Some("City flat".to_string()));
                assert!(store
                    .find_one(&FilterSpec::equals("code", "none"))
                    .await
                    .unwrap()
                    .is_none());
            }

            #[tokio::test]
            async fn test_concurrent_creates() {
                let store = $factory;
                let mut handles = Vec::new();
                for record in numbered_listings(10) {
                    let store = store.clone();
                    handles.push(tokio::spawn(async move { store.create(record).await }));
                }
                for handle in handles {
                    handle.await.unwrap().unwrap();
                }
                assert_eq!(store.count(&FilterSpec::new()).await.unwrap(), 10);
            }
        }
    };
}
