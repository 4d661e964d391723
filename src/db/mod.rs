//! SQLite database module
//!
//! Local store for agents, projects, the vote ledger, and the activity
//! log. The unique indexes here are the authoritative source of
//! `Conflict` errors; handler-level pre-checks only exist to return
//! friendlier messages.
//!
//! ## Tables
//!
//! - `agents` - wallet-keyed agent registry (wallet UNIQUE)
//! - `projects` - submitted projects with running vote aggregates
//! - `votes` - append-only ledger, UNIQUE(agent_id, project_id)
//! - `activity_log` - append-only audit trail of mutating operations

pub mod activity;
pub mod agents;
pub mod projects;
pub mod schema;
pub mod votes;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::ApiError;

/// SQLite database handle shared across request handlers
pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    /// Open or create the database file
    pub fn open(path: &Path) -> Result<Self, ApiError> {
        info!("Opening SQLite database at {:?}", path);

        let conn = Connection::open(path)?;

        // WAL for better concurrent read behavior; enforce FK cascade order
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, ApiError> {
        debug!("Opening in-memory SQLite database");

        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;

        Ok(db)
    }

    fn init_schema(&self) -> Result<(), ApiError> {
        self.with_conn(|conn| schema::init_schema(conn))
    }

    /// Run a read/write closure against the connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Connection) -> Result<T, ApiError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ApiError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Run a closure with exclusive access, for explicit transactions
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Connection) -> Result<T, ApiError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| ApiError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&mut conn)
    }
}
