use thiserror::Error;

/// Errors returned to the transport layer. Mostly pass-throughs; the
/// transport renders `Display` text back to the user.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Scheduler(#[from] promobot_scheduler::SchedulerError),

    #[error(transparent)]
    Roles(#[from] promobot_roles::RoleError),

    #[error(transparent)]
    Template(#[from] promobot_templates::TemplateError),

    #[error("Audit log error: {0}")]
    Audit(#[from] promobot_audit::AuditError),

    #[error("Permission denied: {reason}")]
    Forbidden { reason: String },

    #[error("No template recording in progress")]
    NotRecording,
}

pub type Result<T> = std::result::Result<T, ControlError>;
