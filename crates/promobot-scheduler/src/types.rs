use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use promobot_core::{ChatId, JobId, PrincipalId, TargetRef, TemplatePayload};

/// Defines when and how often a job posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// Dispatch a single attempt immediately after the job starts.
    Once,

    /// Dispatch at fixed phase every `every_secs` seconds, stopping after
    /// `max_repeats` attempts when set.
    Interval {
        every_secs: u64,
        max_repeats: Option<u32>,
    },
}

impl Schedule {
    /// Reject malformed parameters before a job is ever created.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Schedule::Once => Ok(()),
            Schedule::Interval {
                every_secs,
                max_repeats,
            } => {
                if *every_secs == 0 {
                    return Err("interval must be at least one second".to_string());
                }
                if *max_repeats == Some(0) {
                    return Err("max_repeats must be at least 1".to_string());
                }
                Ok(())
            }
        }
    }

    /// The interval between attempts, if the schedule repeats.
    pub fn every(&self) -> Option<std::time::Duration> {
        match self {
            Schedule::Once => None,
            Schedule::Interval { every_secs, .. } => {
                Some(std::time::Duration::from_secs(*every_secs))
            }
        }
    }

    /// Upper bound on attempts; `None` means unbounded.
    pub fn max_attempts(&self) -> Option<u32> {
        match self {
            Schedule::Once => Some(1),
            Schedule::Interval { max_repeats, .. } => *max_repeats,
        }
    }

    /// Short human-readable form for audit notes and status cards.
    pub fn describe(&self) -> String {
        match self {
            Schedule::Once => "once".to_string(),
            Schedule::Interval {
                every_secs,
                max_repeats: Some(n),
            } => format!("every {every_secs}s, {n} times"),
            Schedule::Interval { every_secs, .. } => format!("every {every_secs}s"),
        }
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Created but not yet running (SAFE_MODE gate, or awaiting Start).
    Queued,
    /// Posting loop active.
    Running,
    /// Loop suspended; no attempts are dispatched.
    Paused,
    /// Stop requested; the loop is winding down (an in-flight attempt may
    /// still finish). Exists only to make cancellation race-free.
    Stopping,
    /// Stopped by command. Terminal.
    Stopped,
    /// Schedule exhausted by design. Terminal.
    Completed,
    /// Ended by an unrecoverable send error. Terminal.
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Stopped | JobState::Completed | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Paused => "paused",
            JobState::Stopping => "stopping",
            JobState::Stopped => "stopped",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobState::Queued),
            "running" => Ok(JobState::Running),
            "paused" => Ok(JobState::Paused),
            "stopping" => Ok(JobState::Stopping),
            "stopped" => Ok(JobState::Stopped),
            "completed" => Ok(JobState::Completed),
            "failed" => Ok(JobState::Failed),
            other => Err(format!("unknown job state: {other}")),
        }
    }
}

/// One posting job. Mutated only by the runtime, behind its per-job lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub creator: PrincipalId,
    pub chat: ChatId,
    /// The message every posting replies to.
    pub target: TargetRef,
    /// Template snapshot captured at creation time.
    pub payload: TemplatePayload,
    pub schedule: Schedule,
    pub state: JobState,
    /// Dispatches begun. Incremented when an attempt starts, so
    /// `success_count + failure_count <= attempts_made` at every instant.
    pub attempts_made: u32,
    pub success_count: u32,
    pub failure_count: u32,
    /// Wall-clock instant of the next planned attempt, if one is scheduled.
    pub next_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_transition_at: DateTime<Utc>,
}

impl Job {
    /// Read-only view for status queries. Mutates nothing.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            creator: self.creator,
            state: self.state,
            schedule: self.schedule.clone(),
            attempts_made: self.attempts_made,
            success_count: self.success_count,
            failure_count: self.failure_count,
            next_run: self.next_run,
            created_at: self.created_at,
            last_transition_at: self.last_transition_at,
        }
    }
}

/// Point-in-time view of a job, as rendered by the control surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub creator: PrincipalId,
    pub state: JobState,
    pub schedule: Schedule,
    pub attempts_made: u32,
    pub success_count: u32,
    pub failure_count: u32,
    pub next_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_transition_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_invalid() {
        let s = Schedule::Interval {
            every_secs: 0,
            max_repeats: None,
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn zero_max_repeats_is_invalid() {
        let s = Schedule::Interval {
            every_secs: 5,
            max_repeats: Some(0),
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn once_caps_attempts_at_one() {
        assert_eq!(Schedule::Once.max_attempts(), Some(1));
        assert!(Schedule::Once.every().is_none());
    }

    #[test]
    fn state_round_trips_through_str() {
        use std::str::FromStr;
        for state in [
            JobState::Queued,
            JobState::Running,
            JobState::Paused,
            JobState::Stopping,
            JobState::Stopped,
            JobState::Completed,
            JobState::Failed,
        ] {
            assert_eq!(JobState::from_str(&state.to_string()).unwrap(), state);
        }
    }
}
