//! `promobot-scheduler` — the job lifecycle engine.
//!
//! # Overview
//!
//! A [`runtime::JobRuntime`] owns the authoritative map from job id to job
//! plus each job's live posting loop. Every job runs its loop as its own
//! Tokio task; control commands (start/pause/stop) are synchronous calls that
//! serialise against the loop through a per-job lock and a `watch` signal
//! channel. Jobs are persisted to a SQLite `jobs` table so they can be
//! reconciled after a restart.
//!
//! # State machine
//!
//! | From     | Event      | To        |
//! |----------|------------|-----------|
//! | Queued   | Start      | Running   |
//! | Queued   | Stop       | Stopped   |
//! | Running  | Pause      | Paused    |
//! | Running  | Stop       | Stopping  |
//! | Paused   | Start      | Running   |
//! | Paused   | Stop       | Stopping  |
//! | Stopping | LoopExited | Stopped   |
//! | Running  | Exhausted  | Completed |
//! | Running  | Fatal      | Failed    |
//!
//! Stopped, Completed and Failed are terminal; nothing leaves them.

pub mod db;
pub mod error;
pub mod runtime;
pub mod state;
pub mod types;

pub use error::{Result, SchedulerError};
pub use runtime::{JobRuntime, RuntimeConfig};
pub use state::{next_state, JobEvent};
pub use types::{Job, JobSnapshot, JobState, Schedule};
