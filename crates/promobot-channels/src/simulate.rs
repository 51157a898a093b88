use async_trait::async_trait;
use tracing::info;

use promobot_core::{ChatId, TargetRef, TemplatePayload};

use crate::error::SendError;
use crate::sink::MessageSink;

/// Sink that logs instead of sending — safe default for demos and local runs.
#[derive(Debug, Default)]
pub struct SimulatedSink;

#[async_trait]
impl MessageSink for SimulatedSink {
    async fn post(
        &self,
        chat: ChatId,
        target: TargetRef,
        payload: &TemplatePayload,
    ) -> Result<(), SendError> {
        let preview: String = payload.text.chars().take(120).collect();
        info!(%chat, %target, %preview, "[simulated send]");
        Ok(())
    }
}
