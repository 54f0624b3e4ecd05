//! Webhook response bodies and the error type that maps to HTTP 500.

use crate::channels::ChannelError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// JSON body returned by `POST /webhook`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WebhookStatus {
    /// `{"status":"success"}`: handled, or accepted as a no-op.
    Success,
    /// `{"status":"error","message":...}`
    Error { message: String },
}

/// Failures that surface to the webhook caller as 500.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("invalid webhook payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("failed to send reply: {0}")]
    ReplyFailed(#[from] ChannelError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        log::warn!("webhook: {}", self);
        let body = WebhookStatus::Error {
            message: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
