use async_trait::async_trait;

use promobot_core::{ChatId, TargetRef, TemplatePayload};

use crate::error::SendError;

/// Capability for delivering one message into a chat as a reply.
///
/// Implementations must be `Send + Sync`: the sink is shared by every job
/// loop and called concurrently. A single job's own attempts are never
/// concurrent with each other — the scheduler guarantees that.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Post `payload` into `chat`, replying to `target`.
    ///
    /// Must resolve `target` at call time and classify any failure as
    /// [`SendError::Transient`] or [`SendError::Permanent`].
    async fn post(
        &self,
        chat: ChatId,
        target: TargetRef,
        payload: &TemplatePayload,
    ) -> Result<(), SendError>;
}
