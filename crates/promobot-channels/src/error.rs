use thiserror::Error;

/// Outcome taxonomy for a single post attempt.
///
/// The split is what the scheduler keys its recovery policy on: transient
/// failures count against the attempt and the job continues; permanent
/// failures end the job as Failed.
#[derive(Debug, Clone, Error)]
pub enum SendError {
    /// Network hiccup, rate limit, target message temporarily unresolvable —
    /// retryable on the next scheduled attempt.
    #[error("Transient send failure: {0}")]
    Transient(String),

    /// Target deleted, bot removed from the chat, payload rejected — no
    /// future attempt can succeed.
    #[error("Permanent send failure: {0}")]
    Permanent(String),
}

impl SendError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, SendError::Permanent(_))
    }
}
