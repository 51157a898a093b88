use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::debug;

use promobot_core::{JobId, PrincipalId};

use crate::db::init_db;
use crate::error::Result;
use crate::types::{AuditEntry, EventKind};

/// Thread-safe append-only log backed by SQLite.
///
/// Wraps a single connection in a `Mutex`; append ordering per job therefore
/// matches the order callers take the lock, which the scheduler serialises
/// per job anyway.
pub struct AuditLog {
    db: Mutex<Connection>,
}

impl AuditLog {
    /// Wrap an open connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Append one entry. Never updates or deletes existing rows.
    pub fn append(&self, entry: &AuditEntry) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO audit_log (ts, job_id, actor, kind, from_state, to_state, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                entry.timestamp.to_rfc3339(),
                entry.job_id.map(|j| j.0),
                entry.actor.map(|a| a.0),
                entry.kind.to_string(),
                entry.from_state,
                entry.to_state,
                entry.note,
            ],
        )?;
        debug!(kind = %entry.kind, job_id = ?entry.job_id, "audit entry appended");
        Ok(())
    }

    /// Return the full history for one job in append order.
    pub fn entries_for_job(&self, job_id: JobId) -> Result<Vec<AuditEntry>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT ts, job_id, actor, kind, from_state, to_state, note
             FROM audit_log WHERE job_id = ?1 ORDER BY seq",
        )?;
        let entries = stmt
            .query_map([job_id.0], row_to_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Total number of appended entries (all jobs).
    pub fn len(&self) -> Result<u64> {
        let db = self.db.lock().unwrap();
        let n: u64 = db.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
        Ok(n)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    let ts: String = row.get(0)?;
    let kind: String = row.get(3)?;
    Ok(AuditEntry {
        timestamp: DateTime::parse_from_rfc3339(&ts)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        job_id: row.get::<_, Option<i64>>(1)?.map(JobId),
        actor: row.get::<_, Option<i64>>(2)?.map(PrincipalId),
        kind: EventKind::from_str(&kind).unwrap_or(EventKind::Transition),
        from_state: row.get(4)?,
        to_state: row.get(5)?,
        note: row.get(6)?,
    })
}
