//! Stats summary endpoint

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;

use super::SharedState;
use crate::db::{agents, projects, votes};
use crate::error::ApiError;

/// Cohort count shown on the landing stats. Fixed for the current
/// program; not derived from any table.
const COHORT_COUNT: i64 = 2;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_projects: i64,
    pub active_agents: i64,
    pub total_votes: i64,
    pub cohorts: i64,
}

/// GET /api/stats
pub async fn summary(State(state): State<SharedState>) -> Result<Json<StatsSummary>, ApiError> {
    let (total_projects, active_agents, total_votes) = state.db.with_conn(|conn| {
        Ok((
            projects::count(conn)?,
            agents::count_active(conn)?,
            votes::count(conn)?,
        ))
    })?;

    Ok(Json(StatsSummary {
        total_projects,
        active_agents,
        total_votes,
        cohorts: COHORT_COUNT,
    }))
}
