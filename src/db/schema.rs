//! Database schema definitions

use rusqlite::Connection;
use tracing::info;

use crate::error::ApiError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<(), ApiError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new database schema v{}", SCHEMA_VERSION);
        create_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else {
        info!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &Connection) -> Result<i32, ApiError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), ApiError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?)", [version])?;
    Ok(())
}

fn create_tables(conn: &Connection) -> Result<(), ApiError> {
    conn.execute_batch(AGENTS_SCHEMA)?;
    conn.execute_batch(PROJECTS_SCHEMA)?;
    conn.execute_batch(VOTES_SCHEMA)?;
    conn.execute_batch(ACTIVITY_SCHEMA)?;
    Ok(())
}

/// Migrate schema from older version
fn migrate_schema(conn: &Connection, _from_version: i32) -> Result<(), ApiError> {
    // Migration steps go here as the schema evolves
    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

/// Agent registry. Wallet uniqueness is enforced here, not just in the
/// register pre-check.
const AGENTS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS agents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    wallet TEXT NOT NULL UNIQUE,
    creator_wallet TEXT NOT NULL,
    description TEXT,
    endpoint TEXT,
    tx_hash TEXT NOT NULL,
    nbook_balance INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending',
    votes_cast INTEGER NOT NULL DEFAULT 0,
    accuracy REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

const PROJECTS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    ticker TEXT,
    description TEXT NOT NULL,
    team TEXT,
    tokenomics TEXT,
    pitch TEXT,
    website TEXT,
    twitter TEXT,
    github TEXT,
    category TEXT NOT NULL DEFAULT 'DeFi',
    stage TEXT NOT NULL DEFAULT 'Pre-seed',
    status TEXT NOT NULL DEFAULT 'Under Review',
    rank INTEGER,
    total_votes INTEGER NOT NULL DEFAULT 0,
    avg_score REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Vote ledger. One vote per (agent, project), enforced by the unique
/// index so concurrent check-then-insert races still resolve to 409.
const VOTES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS votes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_id INTEGER NOT NULL,
    project_id INTEGER NOT NULL,
    score REAL NOT NULL,
    reasoning TEXT,
    tech_score REAL,
    market_score REAL,
    tokenomics_score REAL,
    community_score REAL,
    risk_score REAL,
    tx_hash TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (agent_id, project_id),
    FOREIGN KEY (agent_id) REFERENCES agents(id),
    FOREIGN KEY (project_id) REFERENCES projects(id)
);
"#;

const ACTIVITY_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS activity_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    action TEXT NOT NULL,
    method TEXT NOT NULL,
    endpoint TEXT NOT NULL,
    wallet TEXT,
    agent_name TEXT,
    project_name TEXT,
    status_code INTEGER NOT NULL,
    detail TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
