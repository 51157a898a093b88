//! `promobot-audit` — durable, append-only history of job lifecycle events.
//!
//! Entries are persisted to SQLite so the record survives process restarts.
//! Per job, entries are appended in the same order as the transitions they
//! record; replaying them reproduces the job's final state.

pub mod db;
pub mod error;
pub mod log;
pub mod types;

pub use error::{AuditError, Result};
pub use log::AuditLog;
pub use types::{AuditEntry, EventKind};
