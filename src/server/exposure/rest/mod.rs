//! REST API exposure
//!
//! Consumes a [`ServerHost`] and produces the Axum `Router` serving the
//! `/api` resources and the health checks.

pub mod annexures;
pub mod blogs;
pub mod properties;
pub mod queries;
pub mod response;
pub mod team_members;
pub mod users;

use super::super::host::ServerHost;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// REST API exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router from a host
    ///
    /// The returned router carries:
    /// - health checks at `/health` and `/healthz`
    /// - entity routes under `/api/<plural>`
    /// - annexure generation and download under `/api`
    /// - any custom routes, merged at the root
    pub fn build_router(host: Arc<ServerHost>, custom_routes: Vec<Router>) -> Router {
        let api = Router::new()
            .nest("/properties", properties::routes())
            .nest("/team-members", team_members::routes())
            .nest("/queries", queries::routes())
            .nest("/users", users::routes())
            .nest("/blogs", blogs::routes())
            .merge(annexures::routes());

        let mut app = Self::health_routes().nest("/api", api.with_state(host));

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        app.layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "estate-rs"
        }))
    }
}
