//! Activity recorder - best-effort audit trail
//!
//! Every mutating operation appends an entry. Recording never fails the
//! operation that triggered it: a write failure is logged to the process
//! log and swallowed.

use std::sync::Arc;

use tracing::error;

use crate::db::activity::{self, ActivityEntry, ActivityRow};
use crate::db::Db;
use crate::error::ApiError;

/// Default page size for activity listings
pub const DEFAULT_LIMIT: u32 = 50;

/// Hard cap on activity listings regardless of the requested limit
pub const MAX_LIMIT: u32 = 200;

#[derive(Clone)]
pub struct ActivityRecorder {
    db: Arc<Db>,
}

impl ActivityRecorder {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    /// Append an entry. Failures are reported to the process log only.
    pub fn log(&self, entry: ActivityEntry) {
        if let Err(e) = self.db.with_conn(|conn| activity::insert(conn, &entry)) {
            error!(action = %entry.action, error = %e, "Failed to record activity");
        }
    }

    /// Most recent entries, clamped to `MAX_LIMIT`. A zero limit counts
    /// as unset and falls back to the default page size.
    pub fn list(&self, limit: Option<u32>) -> Result<Vec<ActivityRow>, ApiError> {
        let limit = match limit {
            Some(0) | None => DEFAULT_LIMIT,
            Some(n) => n.min(MAX_LIMIT),
        };
        self.db.with_conn(|conn| activity::list(conn, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> ActivityRecorder {
        ActivityRecorder::new(Arc::new(Db::open_in_memory().unwrap()))
    }

    fn entry(action: &str) -> ActivityEntry {
        ActivityEntry {
            action: action.to_string(),
            method: "POST".to_string(),
            endpoint: "/api/test".to_string(),
            status_code: 200,
            ..Default::default()
        }
    }

    #[test]
    fn test_newest_first() {
        let rec = recorder();
        rec.log(entry("first"));
        rec.log(entry("second"));

        let rows = rec.list(None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].action, "second");
        assert_eq!(rows[1].action, "first");
    }

    #[test]
    fn test_limit_hard_cap() {
        let rec = recorder();
        for i in 0..250 {
            rec.log(entry(&format!("entry-{}", i)));
        }

        let rows = rec.list(Some(10_000)).unwrap();
        assert_eq!(rows.len(), MAX_LIMIT as usize);

        let rows = rec.list(Some(5)).unwrap();
        assert_eq!(rows.len(), 5);

        let rows = rec.list(None).unwrap();
        assert_eq!(rows.len(), DEFAULT_LIMIT as usize);
    }

    #[test]
    fn test_zero_limit_means_default() {
        let rec = recorder();
        for i in 0..60 {
            rec.log(entry(&format!("entry-{}", i)));
        }

        let rows = rec.list(Some(0)).unwrap();
        assert_eq!(rows.len(), DEFAULT_LIMIT as usize);
    }
}
