//! Project rows

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Project row from the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: i64,
    pub name: String,
    pub ticker: Option<String>,
    pub description: String,
    pub team: Option<String>,
    pub tokenomics: Option<String>,
    pub pitch: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub category: String,
    pub stage: String,
    pub status: String,
    pub rank: Option<i64>,
    pub total_votes: i64,
    pub avg_score: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl ProjectRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            ticker: row.get("ticker")?,
            description: row.get("description")?,
            team: row.get("team")?,
            tokenomics: row.get("tokenomics")?,
            pitch: row.get("pitch")?,
            website: row.get("website")?,
            twitter: row.get("twitter")?,
            github: row.get("github")?,
            category: row.get("category")?,
            stage: row.get("stage")?,
            status: row.get("status")?,
            rank: row.get("rank")?,
            total_votes: row.get("total_votes")?,
            avg_score: row.get("avg_score")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Fields for a new project submission
#[derive(Debug, Clone)]
pub struct NewProject<'a> {
    pub name: &'a str,
    pub ticker: Option<&'a str>,
    pub description: &'a str,
    pub team: Option<&'a str>,
    pub tokenomics: Option<&'a str>,
    pub pitch: Option<&'a str>,
    pub website: Option<&'a str>,
    pub twitter: Option<&'a str>,
    pub github: Option<&'a str>,
    pub category: &'a str,
    pub stage: &'a str,
}

pub fn insert(conn: &Connection, project: &NewProject) -> Result<i64, ApiError> {
    conn.execute(
        "INSERT INTO projects (name, ticker, description, team, tokenomics, pitch, website, twitter, github, category, stage)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            project.name,
            project.ticker,
            project.description,
            project.team,
            project.tokenomics,
            project.pitch,
            project.website,
            project.twitter,
            project.github,
            project.category,
            project.stage,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Manually ranked projects first (rank ascending), then newest submissions
pub fn list(conn: &Connection) -> Result<Vec<ProjectRow>, ApiError> {
    let mut stmt = conn.prepare(
        "SELECT * FROM projects
         ORDER BY CASE WHEN rank IS NOT NULL THEN rank ELSE 9999 END ASC, created_at DESC",
    )?;
    let rows = stmt
        .query_map([], ProjectRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn exists(conn: &Connection, id: i64) -> Result<bool, ApiError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM projects WHERE id = ?",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn get_name(conn: &Connection, id: i64) -> Result<Option<String>, ApiError> {
    let name = conn
        .query_row(
            "SELECT name FROM projects WHERE id = ?",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(name)
}

/// Partial update of status and/or rank. `updated_at` always refreshes.
pub fn update(
    conn: &Connection,
    id: i64,
    status: Option<&str>,
    rank: Option<Option<i64>>,
) -> Result<(), ApiError> {
    let mut sets: Vec<&str> = Vec::new();
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(status) = status {
        sets.push("status = ?");
        args.push(Box::new(status.to_string()));
    }
    if let Some(rank) = rank {
        sets.push("rank = ?");
        args.push(Box::new(rank));
    }
    sets.push("updated_at = datetime('now')");
    args.push(Box::new(id));

    let sql = format!("UPDATE projects SET {} WHERE id = ?", sets.join(", "));
    conn.execute(&sql, rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())))?;
    Ok(())
}

/// Recompute the running vote count and mean score from the ledger.
/// Keeps the denormalized columns consistent with the vote rows.
pub fn refresh_vote_stats(conn: &Connection, id: i64) -> Result<(), ApiError> {
    conn.execute(
        "UPDATE projects SET
            total_votes = (SELECT COUNT(*) FROM votes WHERE project_id = ?1),
            avg_score = COALESCE((SELECT AVG(score) FROM votes WHERE project_id = ?1), 0)
         WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

pub fn count(conn: &Connection) -> Result<i64, ApiError> {
    let count = conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
    Ok(count)
}
