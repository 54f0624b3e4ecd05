//! Outbound side of a channel: deliver a reply to a conversation.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("chatwoot account id not configured")]
    MissingAccountId,
    #[error("chatwoot request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("chatwoot api error: {0}")]
    Api(String),
}

/// Handle to a channel the relay can reply through.
#[async_trait]
pub trait ChannelHandle: Send + Sync {
    /// Channel id (e.g. "chatwoot").
    fn id(&self) -> &str;

    /// Send a text message to a conversation.
    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<(), ChannelError>;

    /// Like `send_message`, but logs the failure and reports success as a bool.
    async fn send(&self, conversation_id: &str, text: &str) -> bool {
        match self.send_message(conversation_id, text).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{}: reply to conversation {} failed: {}", self.id(), conversation_id, e);
                false
            }
        }
    }
}
