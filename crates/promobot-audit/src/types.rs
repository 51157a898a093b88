use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use promobot_core::{JobId, PrincipalId};

/// What happened. Control actions carry an actor; loop-driven events do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    JobCreated,
    /// Any state-machine transition (from/to recorded alongside).
    Transition,
    /// One attempt dispatched successfully.
    AttemptSent,
    /// One attempt failed transiently; the job keeps running.
    AttemptFailed,
    RoleAssigned,
    RoleRevoked,
    /// Job state reconciled after a process restart.
    Recovered,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventKind::JobCreated => "job_created",
            EventKind::Transition => "transition",
            EventKind::AttemptSent => "attempt_sent",
            EventKind::AttemptFailed => "attempt_failed",
            EventKind::RoleAssigned => "role_assigned",
            EventKind::RoleRevoked => "role_revoked",
            EventKind::Recovered => "recovered",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "job_created" => Ok(EventKind::JobCreated),
            "transition" => Ok(EventKind::Transition),
            "attempt_sent" => Ok(EventKind::AttemptSent),
            "attempt_failed" => Ok(EventKind::AttemptFailed),
            "role_assigned" => Ok(EventKind::RoleAssigned),
            "role_revoked" => Ok(EventKind::RoleRevoked),
            "recovered" => Ok(EventKind::Recovered),
            other => Err(format!("unknown event kind: {other}")),
        }
    }
}

/// One appended record. `from_state`/`to_state` hold the job-state names for
/// transition events and stay empty otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub job_id: Option<JobId>,
    /// The principal that caused the event; `None` for loop-internal events.
    pub actor: Option<PrincipalId>,
    pub kind: EventKind,
    pub from_state: Option<String>,
    pub to_state: Option<String>,
    pub note: Option<String>,
}

impl AuditEntry {
    pub fn now(kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            job_id: None,
            actor: None,
            kind,
            from_state: None,
            to_state: None,
            note: None,
        }
    }

    pub fn job(mut self, id: JobId) -> Self {
        self.job_id = Some(id);
        self
    }

    pub fn by(mut self, actor: PrincipalId) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn states(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from_state = Some(from.into());
        self.to_state = Some(to.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
