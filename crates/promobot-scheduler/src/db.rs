use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use promobot_core::{ChatId, JobId, MessageId, PrincipalId, TargetRef, TemplatePayload};

use crate::error::{Result, SchedulerError};
use crate::types::{Job, JobState, Schedule};

/// Initialise the scheduler schema in `conn` (idempotent).
///
/// The rowid doubles as the monotonically assigned job id.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS jobs (
            id                  INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            creator             INTEGER NOT NULL,
            chat_id             INTEGER NOT NULL,
            reply_to            INTEGER NOT NULL,
            payload             TEXT    NOT NULL,   -- JSON TemplatePayload snapshot
            schedule            TEXT    NOT NULL,   -- JSON Schedule
            state               TEXT    NOT NULL DEFAULT 'queued',
            attempts            INTEGER NOT NULL DEFAULT 0,
            successes           INTEGER NOT NULL DEFAULT 0,
            failures            INTEGER NOT NULL DEFAULT 0,
            next_run            TEXT,               -- ISO-8601 or NULL
            created_at          TEXT    NOT NULL,
            last_transition_at  TEXT    NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_jobs_state ON jobs (state);
        ",
    )?;
    Ok(())
}

/// Insert a freshly created job and return its assigned id.
pub fn insert_job(
    conn: &Connection,
    creator: PrincipalId,
    chat: ChatId,
    target: TargetRef,
    payload: &TemplatePayload,
    schedule: &Schedule,
    created_at: DateTime<Utc>,
) -> Result<JobId> {
    let payload_json = serde_json::to_string(payload)
        .map_err(|e| SchedulerError::InvalidSchedule(e.to_string()))?;
    let schedule_json = serde_json::to_string(schedule)
        .map_err(|e| SchedulerError::InvalidSchedule(e.to_string()))?;
    let now = created_at.to_rfc3339();

    conn.execute(
        "INSERT INTO jobs
         (creator, chat_id, reply_to, payload, schedule, state,
          attempts, successes, failures, next_run, created_at, last_transition_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 'queued', 0, 0, 0, NULL, ?6, ?6)",
        rusqlite::params![
            creator.0,
            chat.0,
            target.message.0,
            payload_json,
            schedule_json,
            now
        ],
    )?;
    Ok(JobId(conn.last_insert_rowid()))
}

/// Persist the mutable part of a job (state, counters, next_run).
pub fn update_job(conn: &Connection, job: &Job) -> Result<()> {
    conn.execute(
        "UPDATE jobs SET state = ?2, attempts = ?3, successes = ?4, failures = ?5,
                         next_run = ?6, last_transition_at = ?7
         WHERE id = ?1",
        rusqlite::params![
            job.id.0,
            job.state.to_string(),
            job.attempts_made,
            job.success_count,
            job.failure_count,
            job.next_run.map(|t| t.to_rfc3339()),
            job.last_transition_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Load every job that has not reached a terminal state, in id order.
/// Used once at startup for restart reconciliation.
pub fn load_active(conn: &Connection) -> Result<Vec<Job>> {
    let mut stmt = conn.prepare(
        "SELECT id, creator, chat_id, reply_to, payload, schedule, state,
                attempts, successes, failures, next_run, created_at, last_transition_at
         FROM jobs
         WHERE state NOT IN ('stopped', 'completed', 'failed')
         ORDER BY id",
    )?;
    let jobs = stmt
        .query_map([], row_to_job)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(jobs)
}

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<Job> {
    let chat = ChatId(row.get(2)?);
    let payload_json: String = row.get(4)?;
    let schedule_json: String = row.get(5)?;
    let state_str: String = row.get(6)?;
    let next_run: Option<String> = row.get(10)?;
    let created_at: String = row.get(11)?;
    let last_transition_at: String = row.get(12)?;

    Ok(Job {
        id: JobId(row.get(0)?),
        creator: PrincipalId(row.get(1)?),
        chat,
        target: TargetRef {
            chat,
            message: MessageId(row.get(3)?),
        },
        payload: serde_json::from_str(&payload_json).unwrap_or(TemplatePayload {
            text: String::new(),
            photo_ref: None,
        }),
        schedule: serde_json::from_str(&schedule_json).unwrap_or(Schedule::Once),
        state: JobState::from_str(&state_str).unwrap_or(JobState::Queued),
        attempts_made: row.get(7)?,
        success_count: row.get(8)?,
        failure_count: row.get(9)?,
        next_run: next_run.and_then(|t| parse_ts(&t)),
        created_at: parse_ts(&created_at).unwrap_or_else(Utc::now),
        last_transition_at: parse_ts(&last_transition_at).unwrap_or_else(Utc::now),
    })
}

fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
