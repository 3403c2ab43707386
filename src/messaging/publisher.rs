//! Outbound side of the transport.

use crate::messaging::Message;
use async_trait::async_trait;

/// Errors raised when a message cannot be handed to a channel.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The transport refused the message.
    #[error("Message rejected by channel {channel}: {reason}")]
    Rejected { channel: String, reason: String },

    /// The transport is shut down.
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// The payload could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Hands messages to named channels.
///
/// `Ok(())` means the transport accepted the whole message; a failed publish
/// never leaves a partial message behind.
#[async_trait]
pub trait Publisher: Send + Sync + 'static {
    async fn publish(&self, channel: &str, message: Message) -> Result<(), PublishError>;
}
