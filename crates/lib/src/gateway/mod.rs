//! Gateway: the relay's HTTP surface.
//!
//! `POST /webhook` receives Chatwoot events; `GET /` is a health probe.
//! The webhook handler runs inference and posts the reply before responding.

mod protocol;
mod server;

pub use protocol::{WebhookError, WebhookStatus};
pub use server::{router, run_gateway, GatewayState};
