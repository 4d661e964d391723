//! Agent registry rows

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::policy::AgentStatus;

/// Agent row from the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRow {
    pub id: i64,
    pub name: String,
    pub wallet: String,
    pub creator_wallet: String,
    pub description: Option<String>,
    pub endpoint: Option<String>,
    pub tx_hash: String,
    pub nbook_balance: i64,
    pub status: String,
    pub votes_cast: i64,
    pub accuracy: f64,
    pub created_at: String,
}

impl AgentRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            wallet: row.get("wallet")?,
            creator_wallet: row.get("creator_wallet")?,
            description: row.get("description")?,
            endpoint: row.get("endpoint")?,
            tx_hash: row.get("tx_hash")?,
            nbook_balance: row.get("nbook_balance")?,
            status: row.get("status")?,
            votes_cast: row.get("votes_cast")?,
            accuracy: row.get("accuracy")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Fields persisted for a new agent
#[derive(Debug, Clone)]
pub struct NewAgent<'a> {
    pub name: &'a str,
    pub wallet: &'a str,
    pub creator_wallet: &'a str,
    pub description: Option<&'a str>,
    pub endpoint: Option<&'a str>,
    pub tx_hash: &'a str,
    pub nbook_balance: i64,
    pub status: AgentStatus,
}

/// Insert a new agent. The wallet unique index surfaces duplicates as
/// `Conflict` even if the pre-check raced.
pub fn insert(conn: &Connection, agent: &NewAgent) -> Result<i64, ApiError> {
    conn.execute(
        "INSERT INTO agents (name, wallet, creator_wallet, description, endpoint, tx_hash, nbook_balance, status)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            agent.name,
            agent.wallet,
            agent.creator_wallet,
            agent.description,
            agent.endpoint,
            agent.tx_hash,
            agent.nbook_balance,
            agent.status.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_by_wallet(conn: &Connection, wallet: &str) -> Result<Option<AgentRow>, ApiError> {
    let row = conn
        .query_row(
            "SELECT * FROM agents WHERE wallet = ?",
            params![wallet],
            AgentRow::from_row,
        )
        .optional()?;
    Ok(row)
}

pub fn get_name(conn: &Connection, id: i64) -> Result<Option<String>, ApiError> {
    let name = conn
        .query_row(
            "SELECT name FROM agents WHERE id = ?",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(name)
}

pub fn wallet_exists(conn: &Connection, wallet: &str) -> Result<bool, ApiError> {
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM agents WHERE wallet = ?",
            params![wallet],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id.is_some())
}

/// All agents, best performers first
pub fn list(conn: &Connection) -> Result<Vec<AgentRow>, ApiError> {
    let mut stmt =
        conn.prepare("SELECT * FROM agents ORDER BY accuracy DESC, votes_cast DESC")?;
    let rows = stmt
        .query_map([], AgentRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Persist a refreshed balance together with the status it implies
pub fn set_balance_and_status(
    conn: &Connection,
    id: i64,
    balance: i64,
    status: AgentStatus,
) -> Result<(), ApiError> {
    conn.execute(
        "UPDATE agents SET nbook_balance = ?, status = ? WHERE id = ?",
        params![balance, status.as_str(), id],
    )?;
    Ok(())
}

/// Overwrite the stored balance with a fresh on-chain read
pub fn set_balance(conn: &Connection, id: i64, balance: i64) -> Result<(), ApiError> {
    conn.execute(
        "UPDATE agents SET nbook_balance = ? WHERE id = ?",
        params![balance, id],
    )?;
    Ok(())
}

pub fn increment_votes_cast(conn: &Connection, id: i64) -> Result<(), ApiError> {
    conn.execute(
        "UPDATE agents SET votes_cast = votes_cast + 1 WHERE id = ?",
        params![id],
    )?;
    Ok(())
}

pub fn count_active(conn: &Connection) -> Result<i64, ApiError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM agents WHERE status = 'active'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
