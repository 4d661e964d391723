//! Vote ledger rows
//!
//! Append-only. No update or delete path except the administrative
//! cascade when an agent or project is removed.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Vote row joined with agent and project names for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRow {
    pub id: i64,
    pub agent_id: i64,
    pub project_id: i64,
    pub score: f64,
    pub reasoning: Option<String>,
    pub tech_score: Option<f64>,
    pub market_score: Option<f64>,
    pub tokenomics_score: Option<f64>,
    pub community_score: Option<f64>,
    pub risk_score: Option<f64>,
    pub tx_hash: String,
    pub created_at: String,
    pub agent_name: String,
    pub agent_wallet: String,
    pub project_name: String,
}

impl VoteRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            agent_id: row.get("agent_id")?,
            project_id: row.get("project_id")?,
            score: row.get("score")?,
            reasoning: row.get("reasoning")?,
            tech_score: row.get("tech_score")?,
            market_score: row.get("market_score")?,
            tokenomics_score: row.get("tokenomics_score")?,
            community_score: row.get("community_score")?,
            risk_score: row.get("risk_score")?,
            tx_hash: row.get("tx_hash")?,
            created_at: row.get("created_at")?,
            agent_name: row.get("agent_name")?,
            agent_wallet: row.get("agent_wallet")?,
            project_name: row.get("project_name")?,
        })
    }
}

/// Fields for a new vote
#[derive(Debug, Clone)]
pub struct NewVote<'a> {
    pub agent_id: i64,
    pub project_id: i64,
    pub score: f64,
    pub reasoning: Option<&'a str>,
    pub tech_score: Option<f64>,
    pub market_score: Option<f64>,
    pub tokenomics_score: Option<f64>,
    pub community_score: Option<f64>,
    pub risk_score: Option<f64>,
    pub tx_hash: &'a str,
}

/// Insert a vote. The (agent_id, project_id) unique index resolves
/// concurrent duplicates to `Conflict`.
pub fn insert(conn: &Connection, vote: &NewVote) -> Result<i64, ApiError> {
    conn.execute(
        "INSERT INTO votes (agent_id, project_id, score, reasoning, tech_score, market_score, tokenomics_score, community_score, risk_score, tx_hash)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            vote.agent_id,
            vote.project_id,
            vote.score,
            vote.reasoning,
            vote.tech_score,
            vote.market_score,
            vote.tokenomics_score,
            vote.community_score,
            vote.risk_score,
            vote.tx_hash,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn exists(conn: &Connection, agent_id: i64, project_id: i64) -> Result<bool, ApiError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM votes WHERE agent_id = ? AND project_id = ?",
            params![agent_id, project_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Optional filter for vote listings
#[derive(Debug, Clone, Copy, Default)]
pub struct VoteFilter {
    pub agent_id: Option<i64>,
    pub project_id: Option<i64>,
}

/// Votes joined with agent and project names, newest first
pub fn list(conn: &Connection, filter: VoteFilter) -> Result<Vec<VoteRow>, ApiError> {
    let base = "SELECT v.*, a.name AS agent_name, a.wallet AS agent_wallet, p.name AS project_name
         FROM votes v
         JOIN agents a ON v.agent_id = a.id
         JOIN projects p ON v.project_id = p.id";

    // agent_id takes precedence when both filters are supplied
    let (sql, arg) = if let Some(agent_id) = filter.agent_id {
        (format!("{} WHERE v.agent_id = ? ORDER BY v.created_at DESC", base), Some(agent_id))
    } else if let Some(project_id) = filter.project_id {
        (format!("{} WHERE v.project_id = ? ORDER BY v.created_at DESC", base), Some(project_id))
    } else {
        (format!("{} ORDER BY v.created_at DESC", base), None)
    };

    let mut stmt = conn.prepare(&sql)?;
    let rows = match arg {
        Some(id) => stmt
            .query_map(params![id], VoteRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?,
        None => stmt
            .query_map([], VoteRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(rows)
}

/// Scores for every project in one pass, for the project listing
pub fn scores_by_project(conn: &Connection) -> Result<Vec<(i64, f64)>, ApiError> {
    let mut stmt = conn.prepare("SELECT project_id, score FROM votes")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count(conn: &Connection) -> Result<i64, ApiError> {
    let count = conn.query_row("SELECT COUNT(*) FROM votes", [], |row| row.get(0))?;
    Ok(count)
}
