//! Project endpoints
//!
//! Listings carry a derived `consensus` field computed from the vote
//! ledger on every read; it is never stored.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{log_failure, SharedState};
use crate::consensus::consensus_score;
use crate::db::activity::ActivityEntry;
use crate::db::projects::{self, NewProject, ProjectRow};
use crate::db::votes;
use crate::error::ApiError;

/// Project row enriched with the derived consensus score
#[derive(Debug, Serialize)]
pub struct ProjectWithConsensus {
    #[serde(flatten)]
    pub project: ProjectRow,
    pub consensus: Option<i64>,
}

/// GET /api/projects - ranked first, then newest
pub async fn list(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ProjectWithConsensus>>, ApiError> {
    let divisor = state.config.policy.consensus_divisor;

    let (rows, votes) = state.db.with_conn(|conn| {
        Ok((projects::list(conn)?, votes::scores_by_project(conn)?))
    })?;

    let mut scores: HashMap<i64, Vec<f64>> = HashMap::new();
    for (project_id, score) in votes {
        scores.entry(project_id).or_default().push(score);
    }

    let enriched = rows
        .into_iter()
        .map(|project| {
            let project_scores = scores
                .get(&project.id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let consensus = consensus_score(project_scores, divisor);
            ProjectWithConsensus { project, consensus }
        })
        .collect();

    Ok(Json(enriched))
}

/// Submission body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitProjectRequest {
    pub name: Option<String>,
    pub ticker: Option<String>,
    pub description: Option<String>,
    pub team: Option<String>,
    pub tokenomics: Option<String>,
    pub pitch: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub category: Option<String>,
    pub stage: Option<String>,
}

/// POST /api/projects - submit a project for review
pub async fn submit(
    State(state): State<SharedState>,
    Json(req): Json<SubmitProjectRequest>,
) -> Result<Json<Value>, ApiError> {
    let (name, description) = match (req.name.as_deref(), req.description.as_deref()) {
        (Some(n), Some(d)) if !n.is_empty() && !d.is_empty() => (n, d),
        _ => {
            return Err(ApiError::Validation(
                "Name and description are required".to_string(),
            ))
        }
    };

    let category = req.category.as_deref().unwrap_or("DeFi");
    let stage = req.stage.as_deref().unwrap_or("Pre-seed");

    let new_project = NewProject {
        name,
        ticker: req.ticker.as_deref(),
        description,
        team: req.team.as_deref(),
        tokenomics: req.tokenomics.as_deref(),
        pitch: req.pitch.as_deref(),
        website: req.website.as_deref(),
        twitter: req.twitter.as_deref(),
        github: req.github.as_deref(),
        category,
        stage,
    };

    if let Err(e) = state.db.with_conn(|conn| projects::insert(conn, &new_project)) {
        log_failure(&state, "Project Submission Failed", "POST", "/api/projects", &e);
        return Err(e);
    }

    state.activity.log(ActivityEntry {
        action: "Project Submitted".to_string(),
        method: "POST".to_string(),
        endpoint: "/api/projects".to_string(),
        project_name: Some(name.to_string()),
        status_code: 200,
        detail: Some(format!(
            "Ticker: {}, Category: {}, Stage: {}",
            req.ticker.as_deref().unwrap_or("N/A"),
            category,
            stage
        )),
        ..Default::default()
    });

    Ok(Json(json!({ "success": true })))
}

/// Partial update body. A missing field is left untouched; an explicit
/// null rank clears the manual ranking.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProjectRequest {
    pub status: Option<String>,
    #[serde(default, with = "double_option")]
    pub rank: Option<Option<i64>>,
}

/// Distinguish "field absent" from "field explicitly null"
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(d: D) -> Result<Option<Option<i64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<i64>::deserialize(d).map(Some)
    }
}

/// PATCH /api/projects/:id - administrative status/rank update
pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.status.is_none() && req.rank.is_none() {
        return Err(ApiError::Validation("Nothing to update".to_string()));
    }

    state
        .db
        .with_conn(|conn| projects::update(conn, id, req.status.as_deref(), req.rank))?;

    state.activity.log(ActivityEntry {
        action: "Project Updated (Admin)".to_string(),
        method: "PATCH".to_string(),
        endpoint: format!("/api/projects/{}", id),
        status_code: 200,
        detail: Some(format!(
            "Status: {}, Rank: {}",
            req.status.as_deref().unwrap_or("unchanged"),
            match req.rank {
                Some(Some(rank)) => rank.to_string(),
                Some(None) => "null".to_string(),
                None => "unchanged".to_string(),
            }
        )),
        ..Default::default()
    });

    Ok(Json(json!({ "success": true })))
}

/// DELETE /api/projects/:id - cascade votes, then the project row
pub async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let name = state.db.with_conn_mut(|conn| {
        let name = projects::get_name(conn, id)?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM votes WHERE project_id = ?", [id])?;
        tx.execute("DELETE FROM projects WHERE id = ?", [id])?;
        tx.commit()?;
        Ok(name)
    })?;

    state.activity.log(ActivityEntry {
        action: "Project Deleted (Admin)".to_string(),
        method: "DELETE".to_string(),
        endpoint: format!("/api/projects/{}", id),
        project_name: Some(name.unwrap_or_else(|| format!("#{}", id))),
        status_code: 200,
        ..Default::default()
    });

    Ok(Json(json!({ "success": true })))
}
