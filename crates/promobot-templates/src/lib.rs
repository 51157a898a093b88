//! `promobot-templates` — named, owner-scoped message templates.
//!
//! Templates are read exactly once, at job-creation time: the scheduler
//! captures a [`TemplatePayload`](promobot_core::TemplatePayload) snapshot,
//! so editing or deleting a template never affects jobs already created.

pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, TemplateError};
pub use store::TemplateStore;
pub use types::Template;
