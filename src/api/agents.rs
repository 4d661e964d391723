//! Agent registry endpoints

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{log_failure, SharedState};
use crate::db::agents::AgentRow;
use crate::error::ApiError;
use crate::registry::{RegisterAgentRequest, VerificationReport};

/// GET /api/agents - all agents, best performers first
pub async fn list(State(state): State<SharedState>) -> Result<Json<Vec<AgentRow>>, ApiError> {
    let agents = state.registry.list()?;
    Ok(Json(agents))
}

/// POST /api/agents - register a new agent
pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterAgentRequest>,
) -> Result<Json<Value>, ApiError> {
    match state.registry.register(req).await {
        Ok(outcome) => Ok(Json(json!({
            "success": true,
            "status": outcome.status,
            "balance": outcome.balance,
            "threshold": outcome.threshold,
            "verified": outcome.verified,
        }))),
        Err(e) => {
            log_failure(&state, "Agent Registration Failed", "POST", "/api/agents", &e);
            Err(e)
        }
    }
}

/// Verify request body
#[derive(Deserialize)]
pub struct VerifyRequest {
    pub wallet: Option<String>,
}

/// POST /api/agents/verify - re-check an agent's on-chain balance
pub async fn verify(
    State(state): State<SharedState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerificationReport>, ApiError> {
    let wallet = req
        .wallet
        .filter(|w| !w.is_empty())
        .ok_or_else(|| ApiError::Validation("wallet is required".to_string()))?;

    let report = state.registry.verify(&wallet).await?;
    Ok(Json(report))
}

/// DELETE /api/agents/:id - administrative removal, cascades votes
pub async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.registry.remove(id)?;
    Ok(Json(json!({ "success": true })))
}
