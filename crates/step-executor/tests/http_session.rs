use std::time::Duration;

use serde_json::json;
use step_executor::{HttpSessionConfig, HttpSessionProvider, SessionError, SessionProvider};
use text_tester_core_types::WorkflowId;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct Captured {
    request_line: String,
    body: String,
}

fn content_length(head: &str) -> usize {
    for line in head.lines() {
        let lower = line.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("content-length:") {
            return value.trim().parse().unwrap_or(0);
        }
    }
    0
}

/// Accepts one connection, captures the request and answers with `status`.
async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<Captured>) {
    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    serve_raw(response).await
}

/// Like [`serve_once`] but writes `response` bytes exactly as given.
async fn serve_raw(response: String) -> (String, oneshot::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let read = stream.read(&mut chunk).await.expect("read");
            if read == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..read]);
            let Some(end) = buf.windows(4).position(|window| window == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let body_start = end + 4;
            if buf.len() >= body_start + content_length(&head) {
                let _ = tx.send(Captured {
                    request_line: head.lines().next().unwrap_or_default().to_string(),
                    body: String::from_utf8_lossy(&buf[body_start..]).to_string(),
                });
                break;
            }
        }
        stream.write_all(response.as_bytes()).await.expect("write");
        let _ = stream.shutdown().await;
    });
    (format!("http://{addr}"), rx)
}

fn provider(endpoint: &str) -> HttpSessionProvider {
    HttpSessionProvider::new(
        HttpSessionConfig::new(endpoint).with_request_timeout(Duration::from_secs(5)),
    )
    .expect("provider")
}

#[tokio::test]
async fn posts_instruction_to_workflow_route() {
    let (endpoint, captured) = serve_once("200 OK", "{\"price\":\"19.99\"}").await;
    let session = provider(&endpoint)
        .session(&WorkflowId::new("checkout-flow"))
        .await
        .expect("session");

    let value = session
        .extract("extract: the price of the mug")
        .await
        .expect("extract");
    assert_eq!(value, json!({ "price": "19.99" }));

    let captured = captured.await.expect("captured request");
    assert_eq!(
        captured.request_line,
        "POST /workflows/checkout-flow/extract HTTP/1.1"
    );
    let body: serde_json::Value = serde_json::from_str(&captured.body).expect("json body");
    assert_eq!(body, json!({ "instruction": "extract: the price of the mug" }));
}

#[tokio::test]
async fn non_success_status_is_session_error() {
    let (endpoint, _captured) = serve_once("500 Internal Server Error", "{\"error\":\"boom\"}").await;
    let session = provider(&endpoint)
        .session(&WorkflowId::new("login-flow"))
        .await
        .expect("session");

    let err = session.act("act: click login").await.unwrap_err();
    assert_eq!(
        err,
        SessionError::Status {
            status: 500,
            body: "{\"error\":\"boom\"}".to_string()
        }
    );
}

#[tokio::test]
async fn truncated_success_body_is_transport_error() {
    let response = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\nconnection: close\r\n\r\n{\"ok\"".to_string();
    let (endpoint, _captured) = serve_raw(response).await;
    let session = provider(&endpoint)
        .session(&WorkflowId::new("login-flow"))
        .await
        .expect("session");

    let err = session.act("act: click login").await.unwrap_err();
    match err {
        SessionError::Transport(message) => assert!(message.contains("reading body"), "{message}"),
        other => panic!("expected transport error, got {other:?}"),
    }
}
