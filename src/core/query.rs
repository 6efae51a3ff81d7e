//! Sorting, page windows and the paginator

use crate::core::entity::Entity;
use crate::core::error::EstateResult;
use crate::core::field::lookup_path;
use crate::core::filter::FilterSpec;
use crate::core::store::EntityStore;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// Direction of a single sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One field of a compound sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// Ordered list of sort keys.
///
/// Ties on every key are broken by ascending `id`, so a given store state
/// always yields the same sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortOrder {
    keys: Vec<SortKey>,
}

impl SortOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `createdAt` descending
    pub fn newest_first() -> Self {
        Self::new().descending("createdAt")
    }

    pub fn ascending(mut self, field: &str) -> Self {
        self.keys.push(SortKey {
            field: field.to_string(),
            direction: SortDirection::Ascending,
        });
        self
    }

    pub fn descending(mut self, field: &str) -> Self {
        self.keys.push(SortKey {
            field: field.to_string(),
            direction: SortDirection::Descending,
        });
        self
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Compare two serialized records under this order
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for key in &self.keys {
            let ordering = compare_values(lookup_path(a, &key.field), lookup_path(b, &key.field));
            let ordering = match key.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        compare_values(a.get("id"), b.get("id"))
    }
}

/// Missing and null sort first, then booleans, numbers, strings.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// A requested page window; both fields are at least 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Parse raw `page`/`limit` query values.
    ///
    /// Unparseable or non-positive values fall back to page 1 and
    /// `default_limit`; the limit is capped at `max_limit`.
    pub fn from_params(
        page: Option<&str>,
        limit: Option<&str>,
        default_limit: u64,
        max_limit: u64,
    ) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p as u64)
            .unwrap_or(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l >= 1)
            .map(|l| l as u64)
            .unwrap_or(default_limit)
            .min(max_limit.max(1));
        Self::new(page, limit)
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of records before this window
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Pagination metadata as sent on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(request: PageRequest, total: u64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(request.limit())
        };
        Self {
            total,
            page: request.page(),
            limit: request.limit(),
            total_pages,
        }
    }
}

/// One window of records plus its metadata
#[derive(Debug, Clone, Serialize)]
pub struct PageResult<T> {
    #[serde(rename = "data")]
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            pagination: PaginationMeta::new(request, total),
        }
    }

    pub fn total(&self) -> u64 {
        self.pagination.total
    }

    pub fn total_pages(&self) -> u64 {
        self.pagination.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Runs the windowed read and the count for a filter.
///
/// The two reads are independent; under concurrent writes `total` and
/// `items` may disagree by the records written in between.
#[derive(Debug, Clone, Copy, Default)]
pub struct Paginator;

impl Paginator {
    pub fn new() -> Self {
        Self
    }

    pub async fn fetch<T: Entity>(
        &self,
        store: &dyn EntityStore<T>,
        filter: &FilterSpec,
        sort: &SortOrder,
        request: PageRequest,
    ) -> EstateResult<PageResult<T>> {
        let (items, total) = tokio::try_join!(
            store.find(filter, sort, request.skip(), Some(request.limit())),
            store.count(filter),
        )?;

        tracing::debug!(
            entity = T::resource_name(),
            page = request.page(),
            limit = request.limit(),
            total,
            "page fetched"
        );

        Ok(PageResult::new(items, total, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(0, 0);
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), 1);
        assert_eq!(req.skip(), 0);

        assert_eq!(PageRequest::new(3, 10).skip(), 20);
    }

    #[test]
    fn test_page_request_from_params() {
        let req = PageRequest::from_params(Some("2"), Some("10"), 12, 100);
        assert_eq!((req.page(), req.limit()), (2, 10));

        let req = PageRequest::from_params(Some("abc"), Some("-5"), 12, 100);
        assert_eq!((req.page(), req.limit()), (1, 12));

        let req = PageRequest::from_params(Some("0"), Some("500"), 12, 100);
        assert_eq!((req.page(), req.limit()), (1, 100));

        let req = PageRequest::from_params(None, None, 10, 100);
        assert_eq!((req.page(), req.limit()), (1, 10));
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(PaginationMeta::new(PageRequest::new(1, 10), 25).total_pages, 3);
        assert_eq!(PaginationMeta::new(PageRequest::new(1, 10), 30).total_pages, 3);
        assert_eq!(PaginationMeta::new(PageRequest::new(1, 10), 0).total_pages, 0);
        assert_eq!(PaginationMeta::new(PageRequest::new(1, 1), 7).total_pages, 7);
    }

    #[test]
    fn test_page_result_wire_shape() {
        let page = PageResult::new(vec![json!({"id": "a"})], 25, PageRequest::new(2, 10));
        let body = serde_json::to_value(&page).unwrap();
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(
            body["pagination"],
            json!({"total": 25, "page": 2, "limit": 10, "totalPages": 3})
        );
    }

    #[test]
    fn test_sort_featured_then_newest_with_id_tiebreak() {
        let order = SortOrder::new().descending("isFeatured").descending("createdAt");
        let mut rows = vec![
            json!({"id": "b", "isFeatured": false, "createdAt": "2024-01-02T00:00:00.000Z"}),
            json!({"id": "a", "isFeatured": true, "createdAt": "2024-01-01T00:00:00.000Z"}),
            json!({"id": "d", "isFeatured": false, "createdAt": "2024-01-03T00:00:00.000Z"}),
            json!({"id": "c", "isFeatured": false, "createdAt": "2024-01-03T00:00:00.000Z"}),
        ];
        rows.sort_by(|a, b| order.compare(a, b));
        let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["a", "c", "d", "b"]);
    }

    #[test]
    fn test_missing_fields_sort_first_ascending() {
        let order = SortOrder::new().ascending("price");
        assert_eq!(
            order.compare(&json!({"id": "1"}), &json!({"id": "2", "price": 5})),
            Ordering::Less
        );
    }
}
