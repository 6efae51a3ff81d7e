//! `/api/team-members`

use super::response::{Paged, created, deleted, ok, paged, parse_id};
use crate::core::cleanup::Cleanup;
use crate::core::error::{EntityError, EstateResult};
use crate::core::validation::Validated;
use crate::entities::TeamMember;
use crate::entities::team_member::{NewTeamMember, TEAM_MEMBER_FILTERS, TeamMemberPatch};
use crate::server::host::{Params, ServerHost};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<ServerHost>> {
    Router::new()
        .route("/", get(list_members).post(create_member))
        .route("/departments", get(list_departments))
        .route(
            "/{id}",
            get(get_member).put(update_member).delete(delete_member),
        )
}

async fn list_members(
    State(host): State<Arc<ServerHost>>,
    Query(params): Query<Params>,
) -> EstateResult<Json<Paged<TeamMember>>> {
    let page = host
        .list_page(host.stores.team_members.as_ref(), TEAM_MEMBER_FILTERS, &params)
        .await?;
    Ok(paged(page))
}

async fn list_departments(State(host): State<Arc<ServerHost>>) -> EstateResult<Json<Value>> {
    let departments: Vec<Value> = host
        .stores
        .team_members
        .distinct_values("department")
        .await?
        .into_iter()
        .filter(|v| v.as_str().is_some_and(|s| !s.trim().is_empty()))
        .collect();
    Ok(ok(departments))
}

async fn get_member(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
) -> EstateResult<Json<Value>> {
    let id = parse_id(&id)?;
    Ok(ok(find_member(&host, &id).await?))
}

async fn create_member(
    State(host): State<Arc<ServerHost>>,
    Validated(payload): Validated<NewTeamMember>,
) -> EstateResult<(StatusCode, Json<Value>)> {
    let member = host
        .stores
        .team_members
        .create(TeamMember::from_payload(payload))
        .await?;
    tracing::info!(id = %member.id, "team member created");
    Ok(created(member))
}

/// Partial update; a replaced image file is removed once the update lands
async fn update_member(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
    Validated(patch): Validated<TeamMemberPatch>,
) -> EstateResult<Json<Value>> {
    let id = parse_id(&id)?;
    let current = find_member(&host, &id).await?;

    let mut cleanup = Cleanup::new(host.files.clone(), format!("update team member {}", id));
    if let Some(old_image) = patch.replaced_image(&current) {
        cleanup.on_success(old_image);
    }

    let outcome = host
        .stores
        .team_members
        .update_by_id(&id, patch.into_changes())
        .await
        .and_then(|updated| updated.ok_or_else(|| EntityError::not_found("team member", id).into()));
    let updated = cleanup.finish(outcome).await?;
    Ok(ok(updated))
}

async fn delete_member(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
) -> EstateResult<Json<Value>> {
    let id = parse_id(&id)?;
    let member = find_member(&host, &id).await?;

    let mut cleanup = Cleanup::new(host.files.clone(), format!("delete team member {}", id));
    if let Some(image) = member.owned_image() {
        cleanup.on_success(image);
    }

    let outcome = match host.stores.team_members.delete_by_id(&id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(EntityError::not_found("team member", id).into()),
        Err(e) => Err(e),
    };
    cleanup.finish(outcome).await?;

    tracing::info!(id = %id, "team member deleted");
    Ok(deleted())
}

async fn find_member(host: &ServerHost, id: &Uuid) -> EstateResult<TeamMember> {
    host.stores
        .team_members
        .find_by_id(id)
        .await?
        .ok_or_else(|| EntityError::not_found("team member", id).into())
}
