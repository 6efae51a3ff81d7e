//! `/api/users`: investor accounts

use super::response::{counted, created, deleted, ok, parse_id};
use crate::core::entity::Entity;
use crate::core::error::{EntityError, EstateResult};
use crate::core::filter::FilterSpec;
use crate::core::validation::Validated;
use crate::entities::User;
use crate::entities::user::{NewUser, UserPatch};
use crate::server::host::ServerHost;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde_json::Value;
use std::sync::Arc;

pub fn routes() -> Router<Arc<ServerHost>> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
}

/// Every user, newest first
async fn list_users(State(host): State<Arc<ServerHost>>) -> EstateResult<Json<Value>> {
    let users = host
        .stores
        .users
        .find(&FilterSpec::new(), &User::default_sort(), 0, None)
        .await?;
    Ok(counted(users))
}

async fn get_user(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
) -> EstateResult<Json<Value>> {
    let id = parse_id(&id)?;
    let user = host
        .stores
        .users
        .find_by_id(&id)
        .await?
        .ok_or_else(|| EntityError::not_found("user", id))?;
    Ok(ok(user))
}

async fn create_user(
    State(host): State<Arc<ServerHost>>,
    Validated(payload): Validated<NewUser>,
) -> EstateResult<(StatusCode, Json<Value>)> {
    let user = host.stores.users.create(User::from_payload(payload)).await?;
    tracing::info!(id = %user.id, "user created");
    Ok(created(user))
}

async fn update_user(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
    Validated(patch): Validated<UserPatch>,
) -> EstateResult<Json<Value>> {
    let id = parse_id(&id)?;
    let user = host
        .stores
        .users
        .update_by_id(&id, patch.into_changes())
        .await?
        .ok_or_else(|| EntityError::not_found("user", id))?;
    Ok(ok(user))
}

async fn delete_user(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
) -> EstateResult<Json<Value>> {
    let id = parse_id(&id)?;
    if !host.stores.users.delete_by_id(&id).await? {
        return Err(EntityError::not_found("user", id).into());
    }
    Ok(deleted())
}
