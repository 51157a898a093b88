use thiserror::Error;

/// Errors that can occur within the audit subsystem.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;
