//! Integration tests for the MongoDB entity store using the storage test harness.
//!
//! Invokes `entity_store_tests!` to validate that `MongoStore` fully conforms
//! to the `EntityStore<T>` contract, including text and unique indexes.
//!
//! # Requirements
//!
//! - Docker must be running (testcontainers launches a MongoDB container)
//! - Feature flag `mongodb_backend` must be enabled
//!
//! # Running
//!
//! ```sh
//! cargo test --features mongodb_backend --test mongodb_tests
//! ```
//!
//! # Test isolation
//!
//! All tests share a single MongoDB container (via `OnceLock`). Each test
//! gets its own database.

#![cfg(feature = "mongodb_backend")]

#[macro_use]
mod storage_harness;

use estate::core::error::{EstateError, StorageError};
use estate::core::filter::{FilterSpec, Predicate};
use estate::core::store::EntityStore;
use estate::entities::Property;
use estate::storage::{EntityStores, MongoStore};
use mongodb::Client;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use storage_harness::*;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::mongo::Mongo;

// ---------------------------------------------------------------------------
// Shared test environment (single container, fresh database per test)
// ---------------------------------------------------------------------------

struct MongoTestEnv {
    /// Container handle; dropping it stops MongoDB.
    _container: testcontainers::ContainerAsync<Mongo>,
    connection_url: String,
}

static TEST_ENV: OnceLock<MongoTestEnv> = OnceLock::new();

async fn init_mongo_env() -> &'static MongoTestEnv {
    if let Some(env) = TEST_ENV.get() {
        return env;
    }

    let container = Mongo::default()
        .start()
        .await
        .expect("Failed to start MongoDB container, is Docker running?");

    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(27017).await.unwrap();
    let url = format!("mongodb://{}:{}", host, port);

    let env = MongoTestEnv {
        _container: container,
        connection_url: url,
    };

    let _ = TEST_ENV.set(env);
    TEST_ENV.get().unwrap()
}

static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A fresh client on a database no other test uses
async fn mongo_database() -> mongodb::Database {
    let env = init_mongo_env().await;
    let client = Client::with_uri_str(&env.connection_url)
        .await
        .expect("Failed to connect to MongoDB");
    let db_num = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    client.database(&format!("estate_test_{}", db_num))
}

/// Empty listing store with its indexes in place
async fn clean_listing_store() -> MongoStore<TestListing> {
    let store = MongoStore::<TestListing>::new(mongo_database().await);
    store
        .ensure_indexes()
        .await
        .expect("Failed to create indexes");
    store
}

entity_store_tests!(clean_listing_store().await);

// ---------------------------------------------------------------------------
// Backend-specific behavior
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_ensure_indexes_is_idempotent() {
    let store = clean_listing_store().await;
    store.ensure_indexes().await.unwrap();
    store.ensure_indexes().await.unwrap();
}

#[tokio::test]
async fn test_entity_stores_open_every_collection() {
    let stores = EntityStores::mongodb(mongo_database().await).await.unwrap();
    assert_eq!(stores.properties.count(&FilterSpec::new()).await.unwrap(), 0);
    assert_eq!(stores.annexures.count(&FilterSpec::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unreachable_server_is_unavailable() {
    let client = Client::with_uri_str("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200")
        .await
        .unwrap();
    let store = MongoStore::<Property>::new(client.database("estate_unreachable"));

    let err = store.count(&FilterSpec::new()).await.unwrap_err();
    assert!(
        matches!(err, EstateError::Storage(StorageError::Unavailable { .. })),
        "expected unavailable, got {:?}",
        err
    );
    assert_eq!(err.status_code(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_full_text_search_stems_words() {
    let store = clean_listing_store().await;
    store.create(listing("V1", "Garden villa", 1.0, "Pune")).await.unwrap();
    store.create(listing("F1", "City flat", 1.0, "Pune")).await.unwrap();

    // `$text` stems "villas" to "villa"; the in-memory store needs the exact word
    let plural = FilterSpec::new().and(Predicate::FullText {
        query: "villas".to_string(),
    });
    assert_eq!(store.count(&plural).await.unwrap(), 1);

    let negated = FilterSpec::new().and(Predicate::FullText {
        query: "flat -city".to_string(),
    });
    assert_eq!(store.count(&negated).await.unwrap(), 0);
}
