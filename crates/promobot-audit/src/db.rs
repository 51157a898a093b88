use rusqlite::Connection;

use crate::error::Result;

/// Initialise the audit schema in `conn`.
///
/// Creates the append-only `audit_log` table (idempotent) with an index on
/// `job_id` so per-job history queries stay cheap as the log grows.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS audit_log (
            seq         INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            ts          TEXT    NOT NULL,   -- ISO-8601
            job_id      INTEGER,            -- NULL for registry-level events
            actor       INTEGER,            -- NULL for loop-internal events
            kind        TEXT    NOT NULL,
            from_state  TEXT,
            to_state    TEXT,
            note        TEXT
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_audit_job ON audit_log (job_id, seq);
        ",
    )?;
    Ok(())
}
