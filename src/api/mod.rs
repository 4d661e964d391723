//! HTTP API - JSON resource handlers
//!
//! All paths allow cross-origin calls from anywhere; agents are external
//! callers, not hosted logic, and hit these endpoints directly.

pub mod activity;
pub mod agents;
pub mod projects;
pub mod stats;
pub mod votes;

use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::activity::ActivityRecorder;
use crate::config::Config;
use crate::db::activity::ActivityEntry;
use crate::db::Db;
use crate::error::ApiError;
use crate::ledger::VoteLedger;
use crate::registry::AgentRegistry;

/// State shared across handlers
pub struct AppState {
    pub config: Config,
    pub db: Arc<Db>,
    pub registry: AgentRegistry,
    pub ledger: VoteLedger,
    pub activity: ActivityRecorder,
}

pub type SharedState = Arc<AppState>;

/// Create the API router
pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // Agent registry
        .route("/api/agents", get(agents::list).post(agents::register))
        .route("/api/agents/:id", delete(agents::remove))
        .route("/api/agents/verify", post(agents::verify))
        // Projects
        .route("/api/projects", get(projects::list).post(projects::submit))
        .route(
            "/api/projects/:id",
            patch(projects::update).delete(projects::remove),
        )
        // Vote ledger
        .route("/api/votes", get(votes::list).post(votes::cast))
        // Activity trail
        .route("/api/activity", get(activity::list))
        // Stats summary
        .route("/api/stats", get(stats::summary))
        // Health check
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Record a failure entry for unclassified (500-class) errors only;
/// business-rule rejections are surfaced to the caller, not audited.
pub(crate) fn log_failure(
    state: &AppState,
    action: &str,
    method: &str,
    endpoint: &str,
    err: &ApiError,
) {
    if err.status_code().is_server_error() {
        state.activity.log(ActivityEntry {
            action: action.to_string(),
            method: method.to_string(),
            endpoint: endpoint.to_string(),
            status_code: 500,
            detail: Some(err.to_string()),
            ..Default::default()
        });
    }
}
