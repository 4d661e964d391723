//! Activity log rows

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Activity log row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRow {
    pub id: i64,
    pub action: String,
    pub method: String,
    pub endpoint: String,
    pub wallet: Option<String>,
    pub agent_name: Option<String>,
    pub project_name: Option<String>,
    pub status_code: i64,
    pub detail: Option<String>,
    pub created_at: String,
}

impl ActivityRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            action: row.get("action")?,
            method: row.get("method")?,
            endpoint: row.get("endpoint")?,
            wallet: row.get("wallet")?,
            agent_name: row.get("agent_name")?,
            project_name: row.get("project_name")?,
            status_code: row.get("status_code")?,
            detail: row.get("detail")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// One mutating operation worth recording
#[derive(Debug, Clone, Default)]
pub struct ActivityEntry {
    pub action: String,
    pub method: String,
    pub endpoint: String,
    pub wallet: Option<String>,
    pub agent_name: Option<String>,
    pub project_name: Option<String>,
    pub status_code: i64,
    pub detail: Option<String>,
}

pub fn insert(conn: &Connection, entry: &ActivityEntry) -> Result<(), ApiError> {
    conn.execute(
        "INSERT INTO activity_log (action, method, endpoint, wallet, agent_name, project_name, status_code, detail)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            entry.action,
            entry.method,
            entry.endpoint,
            entry.wallet,
            entry.agent_name,
            entry.project_name,
            entry.status_code,
            entry.detail,
        ],
    )?;
    Ok(())
}

/// Most recent entries first, `limit` rows
pub fn list(conn: &Connection, limit: u32) -> Result<Vec<ActivityRow>, ApiError> {
    let mut stmt = conn.prepare("SELECT * FROM activity_log ORDER BY id DESC LIMIT ?")?;
    let rows = stmt
        .query_map(params![limit], ActivityRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
