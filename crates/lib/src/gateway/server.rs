//! Gateway HTTP server: webhook relay and health probe on a single port.

use crate::channels::{ChannelError, ChannelHandle, ChatwootChannel, InboundMessage, WebhookEvent};
use crate::config::RelayConfig;
use crate::gateway::protocol::{WebhookError, WebhookStatus};
use crate::llm::OllamaClient;
use crate::routing::ConversationLocks;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

const SERVICE_NAME: &str = "chatwoot-relay";

/// Shared state for the gateway (config, inference client, reply channel).
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<RelayConfig>,
    pub ollama_client: OllamaClient,
    /// Where generated replies are posted (Chatwoot in production).
    pub channel: Arc<dyn ChannelHandle>,
    pub conversation_locks: Arc<ConversationLocks>,
}

impl GatewayState {
    /// Build clients from config.
    pub fn new(config: RelayConfig) -> Result<Self> {
        let ollama_client =
            OllamaClient::new(&config.inference).context("building inference client")?;
        let channel =
            ChatwootChannel::new(&config.chatwoot).context("building chatwoot client")?;
        Ok(Self {
            config: Arc::new(config),
            ollama_client,
            channel: Arc::new(channel),
            conversation_locks: Arc::new(ConversationLocks::new()),
        })
    }
}

/// Routes: `GET /` health, `POST /webhook` relay.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/webhook", post(chatwoot_webhook))
        .with_state(state)
}

/// Run the gateway server; binds to gateway.bind:gateway.port.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: RelayConfig) -> Result<()> {
    let bind_addr = config.listen_addr();
    log::debug!(
        "relaying chatwoot account {} at {} to model {} at {}",
        config.chatwoot.account_id,
        config.chatwoot.base_url,
        config.inference.model,
        config.inference.endpoint
    );
    if !config.gateway.serialize_conversations {
        log::info!("per-conversation serialization disabled");
    }
    let state = GatewayState::new(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining in-flight webhooks");
}

/// POST /webhook — receives a Chatwoot event; answers incoming messages via the model.
/// Every accepted path (including no-ops) returns 200 success; a malformed body or a failed
/// reply returns 500.
async fn chatwoot_webhook(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Result<Json<WebhookStatus>, WebhookError> {
    let event: WebhookEvent = serde_json::from_slice(&body)?;
    log::debug!(
        "webhook: event {:?} with {} message(s)",
        event.event,
        event.message_count()
    );
    let msg = match event.triage() {
        Ok(msg) => msg,
        Err(reason) => {
            log::debug!("webhook: skipped ({})", reason);
            return Ok(Json(WebhookStatus::Success));
        }
    };
    relay_message(&state, &msg).await?;
    Ok(Json(WebhookStatus::Success))
}

/// Generate a reply for one inbound message and post it back to its conversation.
async fn relay_message(state: &GatewayState, msg: &InboundMessage) -> Result<(), ChannelError> {
    let _guard = if state.config.gateway.serialize_conversations {
        Some(state.conversation_locks.lock(&msg.conversation_id).await)
    } else {
        None
    };
    log::info!(
        "webhook: conversation {}: incoming message ({} chars)",
        msg.conversation_id,
        msg.text.chars().count()
    );
    let reply = state.ollama_client.generate(&msg.text).await;
    if reply.trim().is_empty() {
        log::info!(
            "webhook: conversation {}: model returned no text, nothing to send",
            msg.conversation_id
        );
        return Ok(());
    }
    state.channel.send_message(&msg.conversation_id, &reply).await
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "model": state.ollama_client.model(),
    }))
}
