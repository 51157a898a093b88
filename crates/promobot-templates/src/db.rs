use rusqlite::Connection;

use crate::error::Result;

/// Initialise the template schema in `conn` (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS templates (
            owner       INTEGER NOT NULL,
            name        TEXT    NOT NULL,
            body        TEXT    NOT NULL,
            photo_ref   TEXT,
            created_at  TEXT    NOT NULL,
            PRIMARY KEY (owner, name)
        ) STRICT;
        ",
    )?;
    Ok(())
}
