use thiserror::Error;

use promobot_core::JobId;

use crate::types::JobState;

/// Errors surfaced by the job runtime. Every user-facing failure is an
/// explicit outcome here; nothing is silently dropped.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The acting principal lacks the required capability. No state changed.
    #[error("Permission denied: {reason}")]
    Forbidden { reason: String },

    /// The command is not legal from the job's current state. No state changed.
    #[error("Cannot {command} a {from} job")]
    InvalidTransition { from: JobState, command: &'static str },

    /// Malformed creation parameters; the job was never created.
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Unknown or archived job id.
    #[error("Job not found: {id}")]
    JobNotFound { id: JobId },

    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Audit log error: {0}")]
    Audit(#[from] promobot_audit::AuditError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
