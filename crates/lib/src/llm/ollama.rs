//! Ollama API client for single-shot, non-streaming generation (`/api/generate`).
//!
//! `generate` never fails: transport and format problems come back as an apology
//! string that is safe to post to the customer.

use crate::config::InferenceConfig;
use serde::{Deserialize, Serialize};

const APOLOGY_TRANSPORT: &str = "I apologize, but I encountered an error: Error calling LLM API";
const APOLOGY_UNEXPECTED: &str = "I apologize, but something went wrong";
pub const APOLOGY_UNRECOGNIZED: &str =
    "I apologize, but I received an unexpected response format from the language model.";

/// Client for the Ollama HTTP API.
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    system_message: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum OllamaError {
    #[error("ollama request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("ollama api error: {0}")]
    Api(String),
    #[error("ollama response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
}

/// Recognized `/api/generate` body. Both fields optional; which one is present decides the shape.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub choices: Option<Vec<GenerateChoice>>,
}

/// One entry of an OpenAI-style `choices` list.
#[derive(Debug, Deserialize)]
pub struct GenerateChoice {
    #[serde(default)]
    pub text: Option<String>,
}

/// Generated text classified by the response shape it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateReply {
    /// Native Ollama shape: `{"response": ...}`.
    Response(String),
    /// Completion shape: `{"choices": [{"text": ...}]}` (first entry).
    Choice(String),
    Unrecognized,
}

impl GenerateReply {
    /// Parse a raw response body. `response` wins over `choices`.
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        let parsed: GenerateResponse = serde_json::from_str(body)?;
        Ok(Self::from(parsed))
    }

    /// Text to hand to the customer; the unrecognized shape maps to a fixed apology.
    pub fn into_text(self) -> String {
        match self {
            GenerateReply::Response(text) | GenerateReply::Choice(text) => text,
            GenerateReply::Unrecognized => APOLOGY_UNRECOGNIZED.to_string(),
        }
    }
}

impl From<GenerateResponse> for GenerateReply {
    fn from(resp: GenerateResponse) -> Self {
        match resp {
            GenerateResponse {
                response: Some(text),
                ..
            } => GenerateReply::Response(text),
            GenerateResponse {
                choices: Some(choices),
                ..
            } => match choices.into_iter().next() {
                Some(GenerateChoice { text: Some(text) }) => GenerateReply::Choice(text),
                _ => GenerateReply::Unrecognized,
            },
            _ => GenerateReply::Unrecognized,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaModel {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Option<Vec<OllamaModel>>,
}

impl OllamaClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, OllamaError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            system_message: config.system_message.clone(),
            client: builder.build()?,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a reply for `prompt`. Errors are folded into an apology string.
    pub async fn generate(&self, prompt: &str) -> String {
        match self.try_generate(prompt).await {
            Ok(reply) => {
                if reply == GenerateReply::Unrecognized {
                    log::warn!("ollama: unrecognized response format");
                }
                reply.into_text()
            }
            Err(OllamaError::Decode(e)) => {
                log::warn!("ollama: {}", e);
                format!("{}: {}", APOLOGY_UNEXPECTED, e)
            }
            Err(e) => {
                log::warn!("ollama: {}", e);
                format!("{}: {}", APOLOGY_TRANSPORT, e)
            }
        }
    }

    /// POST /api/generate with stream: false.
    pub async fn try_generate(&self, prompt: &str) -> Result<GenerateReply, OllamaError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            system: self.system_message.as_deref(),
            stream: false,
        };
        log::debug!("ollama: POST {} (model {})", url, self.model);
        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let text = res.text().await?;
        log::debug!("ollama: raw response: {}", text);
        Ok(GenerateReply::from_body(&text)?)
    }

    /// GET /api/tags — list models available on the server.
    pub async fn list_models(&self) -> Result<Vec<OllamaModel>, OllamaError> {
        let url = format!("{}/api/tags", self.base_url);
        let res = self.client.get(&url).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(OllamaError::Api(format!("{} {}", status, body)));
        }
        let data: TagsResponse = res.json().await?;
        Ok(data.models.unwrap_or_default())
    }
}
