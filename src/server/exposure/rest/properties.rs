//! `/api/properties`

use super::response::{Paged, created, deleted, ok, paged, parse_id};
use crate::core::cleanup::Cleanup;
use crate::core::entity::Entity;
use crate::core::error::{EntityError, EstateResult, ValidationError};
use crate::core::filter::FilterSpec;
use crate::core::query::SortOrder;
use crate::core::validation::Validated;
use crate::entities::property::{NewProperty, PROPERTY_FILTERS, PropertyPatch};
use crate::entities::{Property, PropertyStatus, PropertyType};
use crate::server::host::{Params, ServerHost, with_active_flag};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

const SHORT_LIST_LIMIT: u64 = 6;

pub fn routes() -> Router<Arc<ServerHost>> {
    Router::new()
        .route("/", get(list_properties).post(create_property))
        .route("/types", get(list_types))
        .route("/statuses", get(list_statuses))
        .route("/featured", get(list_featured))
        .route("/type/{property_type}", get(list_by_type))
        .route(
            "/{id}",
            get(get_property).put(update_property).delete(delete_property),
        )
}

async fn list_properties(
    State(host): State<Arc<ServerHost>>,
    Query(params): Query<Params>,
) -> EstateResult<Json<Paged<Value>>> {
    let page = host
        .list_page(host.stores.properties.as_ref(), PROPERTY_FILTERS, &params)
        .await?;
    Ok(paged(page.map(|p| p.to_view())))
}

async fn list_types() -> Json<Value> {
    ok(PropertyType::ALL.map(|t| t.as_str()))
}

async fn list_statuses() -> Json<Value> {
    ok(PropertyStatus::ALL.map(|s| s.as_str()))
}

async fn list_featured(
    State(host): State<Arc<ServerHost>>,
    Query(params): Query<Params>,
) -> EstateResult<Json<Value>> {
    let limit = host.short_list_limit(&params, SHORT_LIST_LIMIT);
    let filter = with_active_flag::<Property>(FilterSpec::new()).flagged("isFeatured");
    let items = host
        .stores
        .properties
        .find(&filter, &SortOrder::newest_first(), 0, Some(limit))
        .await?;
    Ok(ok(views(items)))
}

async fn list_by_type(
    State(host): State<Arc<ServerHost>>,
    Path(property_type): Path<String>,
    Query(params): Query<Params>,
) -> EstateResult<Json<Value>> {
    let property_type = PropertyType::parse(&property_type).ok_or_else(|| {
        ValidationError::field(
            "propertyType",
            format!("'{}' is not a valid property type", property_type),
        )
    })?;
    let limit = host.short_list_limit(&params, SHORT_LIST_LIMIT);
    let filter = with_active_flag::<Property>(FilterSpec::equals(
        "propertyType",
        property_type.as_str(),
    ));
    let items = host
        .stores
        .properties
        .find(&filter, &Property::default_sort(), 0, Some(limit))
        .await?;
    Ok(ok(views(items)))
}

/// By id, or by slug when the segment is not a UUID
async fn get_property(
    State(host): State<Arc<ServerHost>>,
    Path(id_or_slug): Path<String>,
) -> EstateResult<Json<Value>> {
    let found = match Uuid::parse_str(&id_or_slug) {
        Ok(id) => host.stores.properties.find_by_id(&id).await?,
        Err(_) => {
            host.stores
                .properties
                .find_one(&FilterSpec::equals("slug", id_or_slug.as_str()))
                .await?
        }
    };
    let property = found.ok_or_else(|| EntityError::not_found("property", &id_or_slug))?;
    Ok(ok(property.to_view()))
}

async fn create_property(
    State(host): State<Arc<ServerHost>>,
    Validated(payload): Validated<NewProperty>,
) -> EstateResult<(StatusCode, Json<Value>)> {
    let address = payload
        .address
        .clone()
        .ok_or_else(|| ValidationError::field("address", "Address is required"))?;
    let property = host
        .stores
        .properties
        .create(Property::from_payload(payload, address))
        .await?;
    tracing::info!(id = %property.id, slug = %property.slug, "property created");
    Ok(created(property.to_view()))
}

async fn update_property(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
    Validated(patch): Validated<PropertyPatch>,
) -> EstateResult<Json<Value>> {
    let id = parse_id(&id)?;
    let current = find_property(&host, &id).await?;

    let changes = patch.into_changes(&current);
    let updated = host
        .stores
        .properties
        .update_by_id(&id, changes)
        .await?
        .ok_or_else(|| EntityError::not_found("property", id))?;
    Ok(ok(updated.to_view()))
}

/// Hard delete, then best-effort removal of the listing's files
async fn delete_property(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
) -> EstateResult<Json<Value>> {
    let id = parse_id(&id)?;
    let property = find_property(&host, &id).await?;

    let mut cleanup = Cleanup::new(host.files.clone(), format!("delete property {}", id));
    for path in property.file_paths() {
        cleanup.on_success(path);
    }

    let outcome = match host.stores.properties.delete_by_id(&id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(EntityError::not_found("property", id).into()),
        Err(e) => Err(e),
    };
    cleanup.finish(outcome).await?;

    tracing::info!(id = %id, "property deleted");
    Ok(deleted())
}

async fn find_property(host: &ServerHost, id: &Uuid) -> EstateResult<Property> {
    host.stores
        .properties
        .find_by_id(id)
        .await?
        .ok_or_else(|| EntityError::not_found("property", id).into())
}

fn views(items: Vec<Property>) -> Vec<Value> {
    items.iter().map(Property::to_view).collect()
}
