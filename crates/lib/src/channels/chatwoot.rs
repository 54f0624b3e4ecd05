//! Chatwoot channel: post agent replies via the Application API.

use crate::channels::handle::{ChannelError, ChannelHandle};
use crate::config::ChatwootConfig;
use async_trait::async_trait;
use serde::Serialize;

const ACCESS_TOKEN_HEADER: &str = "api_access_token";

#[derive(Debug, Serialize)]
struct ReplyPayload<'a> {
    content: &'a str,
    message_type: &'static str,
}

/// Chatwoot connector: sends outgoing messages into an existing conversation.
#[derive(Clone)]
pub struct ChatwootChannel {
    id: String,
    base_url: String,
    account_id: String,
    api_token: String,
    client: reqwest::Client,
}

impl ChatwootChannel {
    pub fn new(config: &ChatwootConfig) -> Result<Self, ChannelError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            id: "chatwoot".to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            account_id: config.account_id.trim().to_string(),
            api_token: config.api_token.clone(),
            client: builder.build()?,
        })
    }

    /// `{base}/api/v1/accounts/{account}/conversations/{conversation}/messages`
    pub fn messages_url(&self, conversation_id: &str) -> String {
        format!(
            "{}/api/v1/accounts/{}/conversations/{}/messages",
            self.base_url, self.account_id, conversation_id
        )
    }

    /// POST an outgoing message into the conversation.
    pub async fn post_reply(&self, conversation_id: &str, text: &str) -> Result<(), ChannelError> {
        if self.account_id.is_empty() {
            return Err(ChannelError::MissingAccountId);
        }
        let url = self.messages_url(conversation_id);
        log::debug!("chatwoot: POST {}", url);
        let body = ReplyPayload {
            content: text,
            message_type: "outgoing",
        };
        let res = self
            .client
            .post(&url)
            .header(ACCESS_TOKEN_HEADER, &self.api_token)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ChannelError::Api(format!("{} {}", status, body)));
        }
        log::info!("chatwoot: reply sent to conversation {}", conversation_id);
        Ok(())
    }
}

#[async_trait]
impl ChannelHandle for ChatwootChannel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<(), ChannelError> {
        self.post_reply(conversation_id, text).await
    }
}
