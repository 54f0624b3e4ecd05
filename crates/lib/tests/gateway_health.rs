//! Integration test: start the gateway on a free port, GET /, assert health JSON.
//! Does not require Ollama or Chatwoot. The server task is left running when the test ends.

mod common;

use relay::channels::{ChannelHandle, ChatwootChannel};
use relay::gateway;
use relay::llm::OllamaClient;
use serde_json::json;
use std::time::Duration;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

#[tokio::test]
async fn gateway_health_http_responds_with_ok() {
    let port = free_port();
    let mut config = common::config(&common::dead_url(), &common::dead_url());
    config.gateway.port = port;
    config.gateway.bind = "127.0.0.1".to_string();

    let gateway_handle = tokio::spawn(async move {
        let _ = gateway::run_gateway(config).await;
    });

    let url = format!("http://127.0.0.1:{}/", port);
    let client = reqwest::Client::new();
    let mut last_err = None;
    for _ in 0..100 {
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let json: serde_json::Value = resp.json().await.expect("parse JSON");
                assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("ok"));
                assert_eq!(json.get("model").and_then(|v| v.as_str()), Some("mistral"));
                return;
            }
            Ok(_) => {}
            Err(e) => last_err = Some(e),
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    gateway_handle.abort();
    panic!(
        "GET {} did not return 200 with health JSON within 5s; last error: {:?}",
        url, last_err
    );
}

#[tokio::test]
async fn gateway_refuses_port_in_use() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let mut config = common::config(&common::dead_url(), &common::dead_url());
    config.gateway.port = listener.local_addr().unwrap().port();
    config.gateway.bind = "127.0.0.1".to_string();

    let err = gateway::run_gateway(config).await.expect_err("port is taken");
    assert!(format!("{:#}", err).contains("binding to"));
}

#[tokio::test]
async fn chatwoot_send_reports_success_as_bool() {
    let up = common::Upstream::new(json!({}));
    let url = up.spawn().await;
    let config = common::config(&url, &url);
    let channel = ChatwootChannel::new(&config.chatwoot).unwrap();

    assert!(channel.send("77", "hello").await);
    assert_eq!(up.reply_calls()[0].conversation_id, "77");

    let mut failing = common::Upstream::new(json!({}));
    failing.reply_status = axum::http::StatusCode::INTERNAL_SERVER_ERROR;
    let url = failing.spawn().await;
    let config = common::config(&url, &url);
    let channel = ChatwootChannel::new(&config.chatwoot).unwrap();
    assert!(!channel.send("77", "hello").await);
}

#[tokio::test]
async fn ollama_lists_models_and_generates() {
    let up = common::Upstream::new(json!({"response": "pong"}));
    let url = up.spawn().await;
    let config = common::config(&url, &url);
    let client = OllamaClient::new(&config.inference).unwrap();

    let models = client.list_models().await.unwrap();
    assert_eq!(models[0].name, "mistral:latest");
    assert_eq!(models[0].size, Some(4109865159));
    assert_eq!(client.generate("ping").await, "pong");
}
