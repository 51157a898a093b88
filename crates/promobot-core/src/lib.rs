//! `promobot-core` — shared identifiers, role model and configuration.
//!
//! Every other crate in the workspace depends on this one; it carries no
//! behaviour of its own beyond config loading.

pub mod config;
pub mod error;
pub mod types;

pub use config::PromobotConfig;
pub use error::{CoreError, Result};
pub use types::{ChatId, JobId, MessageId, PrincipalId, Role, TargetRef, TemplatePayload};
