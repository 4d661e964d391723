//! Activity trail endpoint

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;

use super::SharedState;
use crate::db::activity::ActivityRow;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

/// GET /api/activity - newest entries first, capped at 200
pub async fn list(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ActivityRow>>, ApiError> {
    let rows = state.activity.list(query.limit)?;
    Ok(Json(rows))
}
