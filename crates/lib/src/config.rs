//! Configuration types and loading.
//!
//! Config is read once from the environment at startup and shared read-only
//! (behind an `Arc`) by the inference client, the reply channel and the webhook handler.

use std::time::Duration;

/// Chatwoot instance root, e.g. `https://chat.example.com`.
pub const ENV_CHATWOOT_BASE_URL: &str = "CHATWOOT_BASE_URL";
/// Chatwoot user or agent-bot access token (sent as `api_access_token`).
pub const ENV_CHATWOOT_API_TOKEN: &str = "CHATWOOT_API_TOKEN";
pub const ENV_CHATWOOT_ACCOUNT_ID: &str = "CHATWOOT_ACCOUNT_ID";
/// Root of the Ollama server, e.g. `http://127.0.0.1:11434`.
pub const ENV_MISTRAL_ENDPOINT: &str = "MISTRAL_ENDPOINT";
pub const ENV_PORT: &str = "PORT";
pub const ENV_BIND: &str = "BIND";
pub const ENV_LLM_MODEL: &str = "LLM_MODEL";
pub const ENV_SYSTEM_MESSAGE: &str = "SYSTEM_MESSAGE";
pub const ENV_INFERENCE_TIMEOUT_SECS: &str = "INFERENCE_TIMEOUT_SECS";
pub const ENV_REPLY_TIMEOUT_SECS: &str = "REPLY_TIMEOUT_SECS";
pub const ENV_SERIALIZE_CONVERSATIONS: &str = "SERIALIZE_CONVERSATIONS";

const DEFAULT_PORT: u16 = 10000;
const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_MODEL: &str = "mistral";
const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 120;
const DEFAULT_REPLY_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Chatwoot side of the relay (where replies are posted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatwootConfig {
    pub base_url: String,
    pub api_token: String,
    pub account_id: String,
    /// None disables the client timeout.
    pub timeout: Option<Duration>,
}

/// Inference side of the relay (Ollama `/api/generate`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceConfig {
    pub endpoint: String,
    pub model: String,
    /// Sent as the `system` field when set.
    pub system_message: Option<String>,
    /// None disables the client timeout.
    pub timeout: Option<Duration>,
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub bind: String,
    pub port: u16,
    /// Handle webhooks for the same conversation one at a time.
    pub serialize_conversations: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            serialize_conversations: true,
        }
    }
}

/// Top-level relay config. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub gateway: GatewayConfig,
    pub chatwoot: ChatwootConfig,
    pub inference: InferenceConfig,
}

impl RelayConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Values are trimmed; blank counts as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let base_url = trim_url(required(ENV_CHATWOOT_BASE_URL)?);
        let api_token = required(ENV_CHATWOOT_API_TOKEN)?;
        let account_id = required(ENV_CHATWOOT_ACCOUNT_ID)?;
        let endpoint = trim_url(required(ENV_MISTRAL_ENDPOINT)?);

        let port = match get(ENV_PORT) {
            Some(v) => parse_value::<u16>(ENV_PORT, v)?,
            None => DEFAULT_PORT,
        };
        let serialize_conversations = match get(ENV_SERIALIZE_CONVERSATIONS) {
            Some(v) => parse_bool(ENV_SERIALIZE_CONVERSATIONS, v)?,
            None => true,
        };

        Ok(Self {
            gateway: GatewayConfig {
                bind: get(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string()),
                port,
                serialize_conversations,
            },
            chatwoot: ChatwootConfig {
                base_url,
                api_token,
                account_id,
                timeout: parse_timeout(
                    ENV_REPLY_TIMEOUT_SECS,
                    get(ENV_REPLY_TIMEOUT_SECS),
                    DEFAULT_REPLY_TIMEOUT_SECS,
                )?,
            },
            inference: InferenceConfig {
                endpoint,
                model: get(ENV_LLM_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                system_message: get(ENV_SYSTEM_MESSAGE),
                timeout: parse_timeout(
                    ENV_INFERENCE_TIMEOUT_SECS,
                    get(ENV_INFERENCE_TIMEOUT_SECS),
                    DEFAULT_INFERENCE_TIMEOUT_SECS,
                )?,
            },
        })
    }

    /// `bind:port` for the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.gateway.bind, self.gateway.port)
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn parse_value<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
        value,
    })
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}

/// Seconds to Duration; 0 means no timeout.
fn parse_timeout(
    name: &'static str,
    value: Option<String>,
    default_secs: u64,
) -> Result<Option<Duration>, ConfigError> {
    let secs = match value {
        Some(v) => parse_value::<u64>(name, v)?,
        None => default_secs,
    };
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}
