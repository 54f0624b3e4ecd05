//! Chatwoot relay library: webhook gateway, Ollama client, Chatwoot channel and config
//! used by the `chatwoot-relay` CLI.

pub mod channels;
pub mod config;
pub mod gateway;
pub mod llm;
pub mod routing;
