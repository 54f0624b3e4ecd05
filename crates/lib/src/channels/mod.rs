//! Communication channels.
//!
//! Inbound: the Chatwoot webhook payload and its triage into an `InboundMessage`.
//! Outbound: the `ChannelHandle` trait and the Chatwoot connector that posts replies.

mod chatwoot;
mod handle;
mod inbound;

pub use chatwoot::ChatwootChannel;
pub use handle::{ChannelError, ChannelHandle};
pub use inbound::{
    ConversationId, InboundMessage, MessageType, SkipReason, WebhookEvent, WebhookMessage,
};
