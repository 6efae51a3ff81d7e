//! `/api/queries`: contact enquiries

use super::response::{Paged, created, deleted, ok, ok_message, paged, parse_id};
use crate::core::error::{EntityError, EstateResult};
use crate::core::validation::Validated;
use crate::entities::ContactQuery;
use crate::entities::contact_query::{NewContactQuery, QUERY_FILTERS, RespondRequest, StatusUpdate};
use crate::server::host::{Params, ServerHost};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<ServerHost>> {
    Router::new()
        .route("/", get(list_queries).post(create_query))
        .route("/{id}", get(get_query).delete(delete_query))
        .route("/{id}/status", put(update_status))
        .route("/{id}/respond", post(respond))
}

async fn create_query(
    State(host): State<Arc<ServerHost>>,
    Validated(payload): Validated<NewContactQuery>,
) -> EstateResult<(StatusCode, Json<Value>)> {
    let query = host
        .stores
        .queries
        .create(ContactQuery::from_payload(payload))
        .await?;
    tracing::info!(id = %query.id, "query received");
    Ok(created(query))
}

async fn list_queries(
    State(host): State<Arc<ServerHost>>,
    Query(params): Query<Params>,
) -> EstateResult<Json<Paged<ContactQuery>>> {
    let page = host
        .list_page(host.stores.queries.as_ref(), QUERY_FILTERS, &params)
        .await?;
    Ok(paged(page))
}

async fn get_query(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
) -> EstateResult<Json<Value>> {
    let id = parse_id(&id)?;
    let query = host
        .stores
        .queries
        .find_by_id(&id)
        .await?
        .ok_or_else(|| EntityError::not_found("query", id))?;
    Ok(ok(query))
}

async fn update_status(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
    Validated(update): Validated<StatusUpdate>,
) -> EstateResult<Json<Value>> {
    let id = parse_id(&id)?;
    let query = apply(&host, &id, update.into_changes()).await?;
    Ok(ok_message("Query status updated", query))
}

async fn respond(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
    Validated(request): Validated<RespondRequest>,
) -> EstateResult<Json<Value>> {
    let id = parse_id(&id)?;
    let query = apply(&host, &id, request.into_changes()).await?;
    tracing::info!(id = %id, "query responded");
    Ok(ok_message("Response recorded", query))
}

async fn delete_query(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
) -> EstateResult<Json<Value>> {
    let id = parse_id(&id)?;
    if !host.stores.queries.delete_by_id(&id).await? {
        return Err(EntityError::not_found("query", id).into());
    }
    Ok(deleted())
}

async fn apply(host: &ServerHost, id: &Uuid, changes: Map<String, Value>) -> EstateResult<ContactQuery> {
    host.stores
        .queries
        .update_by_id(id, changes)
        .await?
        .ok_or_else(|| EntityError::not_found("query", id).into())
}
