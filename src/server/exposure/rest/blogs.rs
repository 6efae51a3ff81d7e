//! `/api/blogs`

use super::response::{counted, created, deleted, ok, parse_id};
use crate::core::entity::Entity;
use crate::core::error::{EntityError, EstateResult};
use crate::core::filter::FilterSpec;
use crate::core::validation::Validated;
use crate::entities::Blog;
use crate::entities::blog::{BlogPatch, NewBlog};
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
        .route("/", get(list_blogs).post(create_blog))
        .route("/{id}", get(get_blog).put(update_blog).delete(delete_blog))
}

async fn list_blogs(State(host): State<Arc<ServerHost>>) -> EstateResult<Json<Value>> {
    let blogs = host
        .stores
        .blogs
        .find(&FilterSpec::new(), &Blog::default_sort(), 0, None)
        .await?;
    Ok(counted(blogs))
}

async fn get_blog(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
) -> EstateResult<Json<Value>> {
    let id = parse_id(&id)?;
    let blog = host
        .stores
        .blogs
        .find_by_id(&id)
        .await?
        .ok_or_else(|| EntityError::not_found("blog", id))?;
    Ok(ok(blog))
}

async fn create_blog(
    State(host): State<Arc<ServerHost>>,
    Validated(payload): Validated<NewBlog>,
) -> EstateResult<(StatusCode, Json<Value>)> {
    let blog = host.stores.blogs.create(Blog::from_payload(payload)).await?;
    Ok(created(blog))
}

async fn update_blog(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
    Validated(patch): Validated<BlogPatch>,
) -> EstateResult<Json<Value>> {
    let id = parse_id(&id)?;
    let blog = host
        .stores
        .blogs
        .update_by_id(&id, patch.into_changes())
        .await?
        .ok_or_else(|| EntityError::not_found("blog", id))?;
    Ok(ok(blog))
}

/// Hard delete; the blog image is not owned by the record
async fn delete_blog(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
) -> EstateResult<Json<Value>> {
    let id = parse_id(&id)?;
    if !host.stores.blogs.delete_by_id(&id).await? {
        return Err(EntityError::not_found("blog", id).into());
    }
    Ok(deleted())
}
