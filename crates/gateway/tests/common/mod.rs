//! Shared fixtures for gateway integration tests.

#![allow(dead_code)]

use std::time::Duration;

use gateway::{Message, ProviderConfig, ProviderKind, TurnRequest};
use mockito::{Mock, ServerGuard};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const API_KEY: &str = "test-key";

/// Mount `/` and `/tools` on a backend mock, listing `tools`.
///
/// Keep the returned mocks alive for the duration of the test.
pub async fn mount_backend(server: &mut ServerGuard, tools: Value) -> (Mock, Mock) {
    let info = server
        .mock("GET", "/")
        .with_header("content-type", "application/json")
        .with_body(json!({"protocol": "MCP", "version": "1.0.0"}).to_string())
        .create_async()
        .await;
    let listing = server
        .mock("GET", "/tools")
        .with_header("content-type", "application/json")
        .with_body(json!({ "tools": tools }).to_string())
        .create_async()
        .await;
    (info, listing)
}

pub fn weather_descriptor() -> Value {
    json!({
        "name": "weather",
        "description": "Get current weather for a city",
        "schema": {"city": {"type": "string", "description": "City name"}}
    })
}

pub fn openai_config(provider: &ServerGuard) -> ProviderConfig {
    ProviderConfig::new(ProviderKind::OpenAi, API_KEY)
        .with_base_url(format!("{}/v1/chat/completions", provider.url()))
}

pub fn anthropic_config(provider: &ServerGuard) -> ProviderConfig {
    ProviderConfig::new(ProviderKind::Anthropic, API_KEY)
        .with_base_url(format!("{}/v1/messages", provider.url()))
}

pub fn ask(question: &str, backend: &ServerGuard, provider: ProviderConfig) -> TurnRequest {
    TurnRequest::new(vec![Message::user(question)], backend.url(), provider)
}

/// OpenAI-style completion body carrying one function call.
pub fn openai_tool_call(id: &str, name: &str, arguments: Value) -> String {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": id,
                    "type": "function",
                    "function": {"name": name, "arguments": arguments.to_string()}
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": {"prompt_tokens": 50, "completion_tokens": 10}
    })
    .to_string()
}

/// OpenAI-style completion body carrying a plain answer.
pub fn openai_answer(text: &str) -> String {
    json!({
        "id": "chatcmpl-2",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 80, "completion_tokens": 12}
    })
    .to_string()
}

/// A backend that answers every request with `body` after `delay`.
///
/// Returns its base URL.
pub async fn slow_server(delay: Duration, body: Value) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = body.to_string();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let body = body.clone();
            tokio::spawn(async move {
                if read_request(&mut socket).await.is_err() {
                    return;
                }
                tokio::time::sleep(delay).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
        let length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + length {
            return Ok(());
        }
    }
}
