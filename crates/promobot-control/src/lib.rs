//! `promobot-control` — the command adapter in front of the scheduler.
//!
//! Inbound interactions (slash commands, button presses, whatever the
//! transport offers) are reified as typed [`Command`]s carrying the invoking
//! principal. The surface re-validates permissions on every call — role
//! assignments can change between a card's render time and a button press —
//! and renders snapshots back as compact status text.

pub mod command;
pub mod error;
pub mod render;
pub mod surface;

pub use command::{Command, Reply};
pub use error::{ControlError, Result};
pub use surface::ControlSurface;
