//! `promobot-roles` — process-wide identity and role registry.
//!
//! Maps a principal to exactly one [`Role`](promobot_core::Role) and answers
//! the capability checks the scheduler and control surface gate on. The Owner
//! is fixed at construction from config and can never be reassigned; all
//! other assignments go through [`RoleRegistry::set_role`].

pub mod error;
pub mod permissions;
pub mod registry;

pub use error::{Result, RoleError};
pub use registry::RoleRegistry;
