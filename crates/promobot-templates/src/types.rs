use serde::{Deserialize, Serialize};

use promobot_core::{PrincipalId, TemplatePayload};

/// A stored template. Identified by (owner, name); the payload is what a job
/// snapshots at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub owner: PrincipalId,
    pub name: String,
    pub payload: TemplatePayload,
    /// ISO-8601 timestamp of creation (or last overwrite).
    pub created_at: String,
}
