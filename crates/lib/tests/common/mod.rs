//! Stub Ollama and Chatwoot servers on ephemeral ports, recording every call.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use relay::config::RelayConfig;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TOKEN: &str = "test-token";
pub const ACCOUNT: &str = "2";

/// One POST received by the stub Chatwoot server.
#[derive(Debug, Clone)]
pub struct ReplyCall {
    pub account_id: String,
    pub conversation_id: String,
    pub token: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
pub struct Upstream {
    pub generate_status: StatusCode,
    pub generate_body: Value,
    pub generate_delay: Duration,
    pub reply_status: StatusCode,
    pub generate_calls: Arc<Mutex<Vec<Value>>>,
    pub reply_calls: Arc<Mutex<Vec<ReplyCall>>>,
    in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl Upstream {
    pub fn new(generate_body: Value) -> Self {
        Self {
            generate_status: StatusCode::OK,
            generate_body,
            generate_delay: Duration::ZERO,
            reply_status: StatusCode::OK,
            generate_calls: Arc::new(Mutex::new(Vec::new())),
            reply_calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn generate_calls(&self) -> Vec<Value> {
        self.generate_calls.lock().unwrap().clone()
    }

    pub fn reply_calls(&self) -> Vec<ReplyCall> {
        self.reply_calls.lock().unwrap().clone()
    }

    /// Start both stubs on one ephemeral port; returns the base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/api/generate", post(generate))
            .route("/api/tags", get(tags))
            .route(
                "/api/v1/accounts/:account/conversations/:conversation/messages",
                post(reply),
            )
            .with_state(self.clone());
        serve(app).await
    }
}

async fn generate(State(up): State<Upstream>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    up.generate_calls.lock().unwrap().push(body);
    let now = up.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    up.max_in_flight.fetch_max(now, Ordering::SeqCst);
    if !up.generate_delay.is_zero() {
        tokio::time::sleep(up.generate_delay).await;
    }
    up.in_flight.fetch_sub(1, Ordering::SeqCst);
    (up.generate_status, Json(up.generate_body.clone()))
}

async fn tags() -> Json<Value> {
    Json(json!({"models": [{"name": "mistral:latest", "size": 4109865159u64}]}))
}

async fn reply(
    State(up): State<Upstream>,
    Path((account_id, conversation_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let token = headers
        .get("api_access_token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    up.reply_calls.lock().unwrap().push(ReplyCall {
        account_id,
        conversation_id,
        token,
        body: body.clone(),
    });
    (up.reply_status, Json(json!({"id": 1, "content": body["content"]})))
}

pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

/// A URL nothing listens on.
pub fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    let port = listener.local_addr().expect("local_addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

pub fn config(chatwoot_url: &str, inference_url: &str) -> RelayConfig {
    let vars: HashMap<&str, String> = HashMap::from([
        ("CHATWOOT_BASE_URL", chatwoot_url.to_string()),
        ("CHATWOOT_API_TOKEN", TOKEN.to_string()),
        ("CHATWOOT_ACCOUNT_ID", ACCOUNT.to_string()),
        ("MISTRAL_ENDPOINT", inference_url.to_string()),
        ("INFERENCE_TIMEOUT_SECS", "5".to_string()),
        ("REPLY_TIMEOUT_SECS", "5".to_string()),
    ]);
    RelayConfig::from_lookup(|name| vars.get(name).cloned()).expect("test config")
}
