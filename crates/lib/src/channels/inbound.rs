//! Chatwoot webhook payload and triage into an actionable inbound message.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Chatwoot `message_type` code for messages written by the contact.
const MESSAGE_TYPE_INCOMING: i64 = 0;

/// Webhook POST body. `event` is informational; only the first entry of `messages` is
/// decoded, so later entries may have any shape.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub event: Option<Value>,
    /// `null` and absent both mean no messages.
    #[serde(default)]
    pub messages: Option<Vec<Value>>,
    #[serde(default)]
    pub conversation: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookMessage {
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub message_type: Option<MessageType>,
}

/// Chatwoot sends ids as integers, some integrations as strings. Anything else is unusable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ConversationId {
    Number(i64),
    Text(String),
    Other(Value),
}

impl ConversationId {
    fn is_usable(&self) -> bool {
        match self {
            ConversationId::Number(_) => true,
            ConversationId::Text(s) => !s.trim().is_empty(),
            ConversationId::Other(_) => false,
        }
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationId::Number(n) => write!(f, "{}", n),
            ConversationId::Text(s) => f.write_str(s.trim()),
            ConversationId::Other(v) => write!(f, "{}", v),
        }
    }
}

/// Numeric code, label, or anything else; only the numeric incoming code is acted upon.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MessageType {
    Code(i64),
    Label(String),
    Other(Value),
}

impl MessageType {
    pub fn is_incoming(&self) -> bool {
        matches!(self, MessageType::Code(MESSAGE_TYPE_INCOMING))
    }
}

/// A validated incoming message: what the relay forwards to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub conversation_id: String,
    /// Content exactly as received.
    pub text: String,
}

/// Why a webhook was accepted without dispatching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoMessages,
    NotIncoming,
    EmptyContent,
    MissingConversation,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::NoMessages => "no messages",
            SkipReason::NotIncoming => "not an incoming message",
            SkipReason::EmptyContent => "empty content",
            SkipReason::MissingConversation => "missing conversation id",
        };
        f.write_str(s)
    }
}

impl WebhookEvent {
    pub fn message_count(&self) -> usize {
        self.messages.as_ref().map_or(0, Vec::len)
    }

    /// Decode the first message. A first entry that is not an object decodes as an empty
    /// message, which has no incoming type.
    fn first_message(&self) -> Option<WebhookMessage> {
        let first = self.messages.as_ref()?.first()?;
        Some(WebhookMessage::deserialize(first).unwrap_or_default())
    }

    fn conversation_id(&self) -> Option<ConversationId> {
        let id = self.conversation.as_ref()?.get("id")?;
        ConversationId::deserialize(id).ok()
    }

    /// Decide whether this event carries an incoming message worth answering.
    pub fn triage(&self) -> Result<InboundMessage, SkipReason> {
        let message = self.first_message().ok_or(SkipReason::NoMessages)?;
        if !message
            .message_type
            .as_ref()
            .is_some_and(MessageType::is_incoming)
        {
            return Err(SkipReason::NotIncoming);
        }
        let text = message
            .content
            .as_ref()
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .ok_or(SkipReason::EmptyContent)?;
        let conversation_id = message
            .conversation_id
            .filter(ConversationId::is_usable)
            .or_else(|| self.conversation_id().filter(ConversationId::is_usable))
            .ok_or(SkipReason::MissingConversation)?;
        Ok(InboundMessage {
            conversation_id: conversation_id.to_string(),
            text: text.to_string(),
        })
    }
}
