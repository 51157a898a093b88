//! `promobot-channels` — the outbound message capability.
//!
//! The scheduler never talks to a chat platform directly; it posts through
//! the [`MessageSink`] trait. Adapters for real transports (Telegram, …) live
//! outside this workspace; [`SimulatedSink`] logs instead of sending and is
//! the default wired by the daemon.

pub mod error;
pub mod simulate;
pub mod sink;

pub use error::SendError;
pub use simulate::SimulatedSink;
pub use sink::MessageSink;
