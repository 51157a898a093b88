use std::sync::Mutex;

use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use promobot_core::{PrincipalId, TemplatePayload};

use crate::db::init_db;
use crate::error::{Result, TemplateError};
use crate::types::Template;

/// Thread-safe SQLite-backed template store.
pub struct TemplateStore {
    db: Mutex<Connection>,
}

impl TemplateStore {
    /// Wrap an open connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Insert or overwrite `owner`'s template `name`.
    pub fn put(&self, owner: PrincipalId, name: &str, payload: &TemplatePayload) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO templates (owner, name, body, photo_ref, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (owner, name) DO UPDATE
             SET body = excluded.body, photo_ref = excluded.photo_ref,
                 created_at = excluded.created_at",
            rusqlite::params![
                owner.0,
                name,
                payload.text,
                payload.photo_ref,
                Utc::now().to_rfc3339()
            ],
        )?;
        info!(%owner, %name, "template saved");
        Ok(())
    }

    /// Fetch a template payload by (owner, name).
    pub fn get(&self, owner: PrincipalId, name: &str) -> Result<TemplatePayload> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            "SELECT body, photo_ref FROM templates WHERE owner = ?1 AND name = ?2",
            rusqlite::params![owner.0, name],
            |row| {
                Ok(TemplatePayload {
                    text: row.get(0)?,
                    photo_ref: row.get(1)?,
                })
            },
        ) {
            Ok(p) => Ok(p),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(TemplateError::NotFound {
                owner: owner.0,
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// List an owner's templates ordered by name.
    pub fn list(&self, owner: PrincipalId) -> Result<Vec<Template>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT name, body, photo_ref, created_at
             FROM templates WHERE owner = ?1 ORDER BY name",
        )?;
        let templates = stmt
            .query_map([owner.0], |row| {
                Ok(Template {
                    owner,
                    name: row.get(0)?,
                    payload: TemplatePayload {
                        text: row.get(1)?,
                        photo_ref: row.get(2)?,
                    },
                    created_at: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(templates)
    }

    /// Delete a template. Jobs holding a snapshot of it are unaffected.
    pub fn remove(&self, owner: PrincipalId, name: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "DELETE FROM templates WHERE owner = ?1 AND name = ?2",
            rusqlite::params![owner.0, name],
        )?;
        if n == 0 {
            return Err(TemplateError::NotFound {
                owner: owner.0,
                name: name.to_string(),
            });
        }
        info!(%owner, %name, "template removed");
        Ok(())
    }
}
