use thiserror::Error;

use promobot_core::PrincipalId;

/// All role-layer errors. Kept separate from the scheduler's error enum so
/// the control surface can map them without coupling layers.
#[derive(Debug, Error)]
pub enum RoleError {
    #[error("Permission denied: {reason}")]
    Forbidden { reason: String },

    #[error("The owner role is fixed and cannot be assigned or revoked: {0}")]
    OwnerImmutable(PrincipalId),
}

pub type Result<T> = std::result::Result<T, RoleError>;
