//! Shared test harness for entity store backends
//!
//! Provides `TestListing`, a record with a nested field, a unique field, an
//! active flag and text-indexed fields, plus helpers for building fixtures.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod entity_store_tests;

use chrono::{DateTime, Duration, Utc};
use estate::core::query::SortOrder;
use estate::impl_entity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingAddress {
    pub city: String,
}

/// Test record covering every predicate kind
///
/// - `title`, `summary`: full-text index
/// - `code`: unique
/// - `price`: range filters
/// - `address.city`: nested, case-insensitive contains
/// - `isFeatured`, `isActive`: boolean flags
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestListing {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub code: String,
    pub kind: String,
    pub price: f64,
    pub address: ListingAddress,
    pub is_featured: bool,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(with = "estate::core::entity::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "estate::core::entity::timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl_entity!(TestListing {
    singular: "test_listing",
    plural: "test_listings",
    display: "test listing",
    text_index: ["title", "summary"],
    unique: ["code"],
    active_flag: "isActive",
    sort: SortOrder::new().descending("isFeatured").descending("createdAt"),
});

/// Fixed reference instant; `listing_at` offsets from it so ordering is exact
pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// A listing created `minutes` after [`base_time`]
pub fn listing_at(code: &str, title: &str, price: f64, city: &str, minutes: i64) -> TestListing {
    let created_at = base_time() + Duration::minutes(minutes);
    TestListing {
        id: Uuid::new_v4(),
        title: title.to_string(),
        summary: format!("{} in {}", title, city),
        code: code.to_string(),
        kind: "Residential".to_string(),
        price,
        address: ListingAddress {
            city: city.to_string(),
        },
        is_featured: false,
        is_active: true,
        category: None,
        created_at,
        updated_at: created_at,
    }
}

pub fn listing(code: &str, title: &str, price: f64, city: &str) -> TestListing {
    listing_at(code, title, price, city, 0)
}

/// `count` listings with codes `L000..`, prices `0, 100, ..`, one minute apart
pub fn numbered_listings(count: usize) -> Vec<TestListing> {
    (0..count)
        .map(|i| {
            listing_at(
                &format!("L{:03}", i),
                &format!("Listing {}", i),
                (i * 100) as f64,
                "Pune",
                i as i64,
            )
        })
        .collect()
}
