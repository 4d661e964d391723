//! Vote ledger endpoints

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{log_failure, SharedState};
use crate::db::votes::{VoteFilter, VoteRow};
use crate::error::ApiError;
use crate::ledger::CastVoteRequest;

/// Listing filters: at most one of agent_id / project_id applies
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub agent_id: Option<i64>,
    pub project_id: Option<i64>,
}

/// GET /api/votes - votes joined with agent and project names
pub async fn list(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<VoteRow>>, ApiError> {
    let rows = state.ledger.list(VoteFilter {
        agent_id: query.agent_id,
        project_id: query.project_id,
    })?;
    Ok(Json(rows))
}

/// POST /api/votes - cast a balance-gated vote
pub async fn cast(
    State(state): State<SharedState>,
    Json(req): Json<CastVoteRequest>,
) -> Result<Json<Value>, ApiError> {
    match state.ledger.cast_vote(req).await {
        Ok(()) => Ok(Json(json!({ "success": true, "message": "Vote recorded" }))),
        Err(e) => {
            log_failure(&state, "Vote Failed", "POST", "/api/votes", &e);
            Err(e)
        }
    }
}
