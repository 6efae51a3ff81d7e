//! Server host: the state every handler sees
//!
//! The host is transport-agnostic. It owns the store handles, the file
//! store, the document generator and the stateless query helpers, and is
//! shared behind an `Arc` by the REST exposure.

use crate::config::AppConfig;
use crate::core::entity::Entity;
use crate::core::error::EstateResult;
use crate::core::files::FileStore;
use crate::core::filter::{FilterSpec, ParamSpec, Predicate, QueryBuilder};
use crate::core::generator::DocumentGenerator;
use crate::core::query::{PageRequest, PageResult, Paginator};
use crate::core::store::EntityStore;
use crate::storage::EntityStores;
use std::collections::HashMap;
use std::sync::Arc;

/// Raw query string parameters
pub type Params = HashMap<String, String>;

/// Host context containing all application state
pub struct ServerHost {
    pub config: Arc<AppConfig>,
    pub stores: EntityStores,
    pub files: Arc<dyn FileStore>,
    pub generator: DocumentGenerator,
    pub query_builder: QueryBuilder,
    pub paginator: Paginator,
}

impl ServerHost {
    pub fn new(
        config: AppConfig,
        stores: EntityStores,
        files: Arc<dyn FileStore>,
        generator: DocumentGenerator,
    ) -> Self {
        let query_builder = QueryBuilder::new(config.pagination.filter_mode);
        Self {
            config: Arc::new(config),
            stores,
            files,
            generator,
            query_builder,
            paginator: Paginator::new(),
        }
    }

    /// Page window from `page`/`limit` params with the entity's default size
    pub fn page_request<T: Entity>(&self, params: &Params) -> PageRequest {
        PageRequest::from_params(
            params.get("page").map(String::as_str),
            params.get("limit").map(String::as_str),
            self.config.default_limit_for(T::resource_name()),
            self.config.pagination.max_limit,
        )
    }

    /// `limit` param for unpaginated short lists (featured, by type)
    pub fn short_list_limit(&self, params: &Params, default: u64) -> u64 {
        PageRequest::from_params(
            None,
            params.get("limit").map(String::as_str),
            default,
            self.config.pagination.max_limit,
        )
        .limit()
    }

    /// Filter built from `params`, restricted to active records when the
    /// entity has an active flag
    pub fn listing_filter<T: Entity>(
        &self,
        schema: &[ParamSpec],
        params: &Params,
    ) -> EstateResult<FilterSpec> {
        let filter = self.query_builder.build(schema, params)?;
        Ok(with_active_flag::<T>(filter))
    }

    /// Filtered, sorted, paginated listing
    pub async fn list_page<T: Entity>(
        &self,
        store: &dyn EntityStore<T>,
        schema: &[ParamSpec],
        params: &Params,
    ) -> EstateResult<PageResult<T>> {
        let filter = self.listing_filter::<T>(schema, params)?;
        let request = self.page_request::<T>(params);
        self.paginator
            .fetch(store, &filter, &T::default_sort(), request)
            .await
    }
}

/// Add the entity's active flag predicate, if it has one
pub fn with_active_flag<T: Entity>(filter: FilterSpec) -> FilterSpec {
    match T::active_flag() {
        Some(flag) => filter.and(Predicate::BooleanFlag {
            field: flag.to_string(),
        }),
        None => filter,
    }
}
