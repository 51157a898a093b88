use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an actor issuing commands (platform-native numeric
/// user id, e.g. a Telegram user id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub i64);

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PrincipalId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

/// Platform-native chat identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform-native message identifier within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The message a job's postings reply to.
///
/// Resolution happens at dispatch time inside the sink; a target that has
/// vanished is a per-attempt error, never fatal to the job by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRef {
    pub chat: ChatId,
    pub message: MessageId,
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chat, self.message)
    }
}

/// Monotonically assigned job identifier (SQLite rowid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub i64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role hierarchy: owner > manager > editor > viewer > none.
///
/// Exactly one Owner exists per process, fixed at startup from config and
/// never reassignable. All other roles are granted and revoked by the Owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Manager,
    Editor,
    Viewer,
    #[default]
    None,
}

impl Role {
    pub fn is_owner(&self) -> bool {
        matches!(self, Role::Owner)
    }

    /// True for any role that may at least read job status.
    pub fn can_view(&self) -> bool {
        !matches!(self, Role::None)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Owner => "owner",
            Role::Manager => "manager",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
            Role::None => "none",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "manager" => Ok(Role::Manager),
            "editor" => Ok(Role::Editor),
            "viewer" => Ok(Role::Viewer),
            "none" => Ok(Role::None),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A captured message payload — text plus an optional opaque photo reference.
///
/// Jobs hold a snapshot of this taken at creation time, so later template
/// edits or deletion never affect a job already scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePayload {
    pub text: String,
    /// Platform file reference (e.g. Telegram file_id), if the template
    /// carries a photo.
    pub photo_ref: Option<String>,
}

impl TemplatePayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            photo_ref: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Owner, Role::Manager, Role::Editor, Role::Viewer, Role::None] {
            assert_eq!(Role::from_str(&role.to_string()).unwrap(), role);
        }
    }

    #[test]
    fn only_none_cannot_view() {
        assert!(Role::Viewer.can_view());
        assert!(Role::Owner.can_view());
        assert!(!Role::None.can_view());
    }
}
