//! Storage constraint integration tests
//!
//! The check-then-insert sequences in the handlers are not atomic under
//! concurrent callers, so the unique indexes must be the authoritative
//! conflict signal. These tests exercise the schema directly, as shipped.

use rusqlite::Connection;
use tempfile::TempDir;

const SCHEMA: &str = r#"
CREATE TABLE agents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    wallet TEXT NOT NULL UNIQUE,
    creator_wallet TEXT NOT NULL,
    tx_hash TEXT NOT NULL,
    nbook_balance INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending',
    votes_cast INTEGER NOT NULL DEFAULT 0,
    accuracy REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE TABLE projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    total_votes INTEGER NOT NULL DEFAULT 0,
    avg_score REAL NOT NULL DEFAULT 0
);
CREATE TABLE votes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_id INTEGER NOT NULL,
    project_id INTEGER NOT NULL,
    score REAL NOT NULL,
    tx_hash TEXT NOT NULL,
    UNIQUE (agent_id, project_id),
    FOREIGN KEY (agent_id) REFERENCES agents(id),
    FOREIGN KEY (project_id) REFERENCES projects(id)
);
"#;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn.execute(
        "INSERT INTO agents (name, wallet, creator_wallet, tx_hash, status)
         VALUES ('scout', '0xaaaa', '0xbbbb', '0x1', 'active')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO projects (name, description) VALUES ('p', 'd')",
        [],
    )
    .unwrap();
    conn
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[test]
fn test_wallet_uniqueness_enforced_by_index() {
    let conn = setup();
    let err = conn
        .execute(
            "INSERT INTO agents (name, wallet, creator_wallet, tx_hash)
             VALUES ('other', '0xaaaa', '0xcccc', '0x2')",
            [],
        )
        .unwrap_err();
    assert!(is_constraint_violation(&err));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM agents WHERE wallet = '0xaaaa'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_one_vote_per_agent_project_pair() {
    let conn = setup();
    conn.execute(
        "INSERT INTO votes (agent_id, project_id, score, tx_hash) VALUES (1, 1, 80, '0x1')",
        [],
    )
    .unwrap();

    let err = conn
        .execute(
            "INSERT INTO votes (agent_id, project_id, score, tx_hash) VALUES (1, 1, 90, '0x2')",
            [],
        )
        .unwrap_err();
    assert!(is_constraint_violation(&err));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM votes", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_vote_requires_existing_project() {
    let conn = setup();
    let err = conn
        .execute(
            "INSERT INTO votes (agent_id, project_id, score, tx_hash) VALUES (1, 42, 80, '0x1')",
            [],
        )
        .unwrap_err();
    assert!(is_constraint_violation(&err));
}

#[test]
fn test_cascade_order_child_before_parent() {
    let conn = setup();
    conn.execute(
        "INSERT INTO votes (agent_id, project_id, score, tx_hash) VALUES (1, 1, 80, '0x1')",
        [],
    )
    .unwrap();

    // Parent first violates referential integrity
    let err = conn.execute("DELETE FROM agents WHERE id = 1", []).unwrap_err();
    assert!(is_constraint_violation(&err));

    // Child first succeeds
    conn.execute("DELETE FROM votes WHERE agent_id = 1", []).unwrap();
    conn.execute("DELETE FROM agents WHERE id = 1", []).unwrap();
}

#[test]
fn test_aggregate_recompute_matches_ledger() {
    let conn = setup();
    conn.execute(
        "INSERT INTO agents (name, wallet, creator_wallet, tx_hash, status)
         VALUES ('second', '0xcccc', '0xbbbb', '0x3', 'active')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO votes (agent_id, project_id, score, tx_hash) VALUES (1, 1, 80, '0x1')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO votes (agent_id, project_id, score, tx_hash) VALUES (2, 1, 90, '0x2')",
        [],
    )
    .unwrap();

    conn.execute(
        "UPDATE projects SET
            total_votes = (SELECT COUNT(*) FROM votes WHERE project_id = 1),
            avg_score = COALESCE((SELECT AVG(score) FROM votes WHERE project_id = 1), 0)
         WHERE id = 1",
        [],
    )
    .unwrap();

    let (total, avg): (i64, f64) = conn
        .query_row("SELECT total_votes, avg_score FROM projects WHERE id = 1", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(total, 2);
    assert!((avg - 85.0).abs() < f64::EPSILON);

    // Removing one agent's votes and recomputing stays consistent
    conn.execute("DELETE FROM votes WHERE agent_id = 1", []).unwrap();
    conn.execute(
        "UPDATE projects SET
            total_votes = (SELECT COUNT(*) FROM votes WHERE project_id = 1),
            avg_score = COALESCE((SELECT AVG(score) FROM votes WHERE project_id = 1), 0)
         WHERE id = 1",
        [],
    )
    .unwrap();

    let (total, avg): (i64, f64) = conn
        .query_row("SELECT total_votes, avg_score FROM projects WHERE id = 1", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(total, 1);
    assert!((avg - 90.0).abs() < f64::EPSILON);
}

#[test]
fn test_wal_database_on_disk() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("buidlbook.db");

    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
        .unwrap();
    conn.execute_batch(SCHEMA).unwrap();

    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |r| r.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
    assert!(db_path.exists());
}
