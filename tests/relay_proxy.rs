//! Relay forwarding against a local echo backend.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::OriginalUri,
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use walletchat::config::RelayConfig;
use walletchat::relay::{RelayHandle, RelayState, start_server};

/// Body of `/binary`: not valid UTF-8.
const BINARY_BODY: &[u8] = &[0xff, 0xfe, 0x00, 0x7b, 0x80];

/// Echoes what it received. `/status/<code>` answers with that status and
/// `/binary` with [`BINARY_BODY`].
async fn echo(
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if uri.path() == "/binary" {
        return Bytes::from_static(BINARY_BODY).into_response();
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let echoed = json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "contentType": header("content-type"),
        "custom": header("x-custom"),
        "body": String::from_utf8_lossy(&body),
    });

    let status = uri
        .path()
        .strip_prefix("/status/")
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);

    // Deliberately not labelled as JSON; the relay must add the header.
    (
        status,
        [(header::CONTENT_TYPE, "text/plain")],
        echoed.to_string(),
    )
        .into_response()
}

async fn start_backend() -> SocketAddr {
    let app = Router::new().fallback(echo);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn start_relay(backend_url: String, strip_prefix: Option<&str>) -> RelayHandle {
    let config = RelayConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        backend_url,
        strip_prefix: strip_prefix.map(str::to_string),
    };
    let state = Arc::new(RelayState::new(&config).unwrap());
    start_server("127.0.0.1:0".parse().unwrap(), state)
        .await
        .unwrap()
}

async fn read_json(response: reqwest::Response) -> Value {
    response.json().await.unwrap()
}

#[tokio::test]
async fn forwards_post_with_prefix_stripped() {
    let backend = start_backend().await;
    let relay = start_relay(format!("http://{backend}"), Some("/n8n")).await;

    let response = reqwest::Client::new()
        .post(format!(
            "http://{}/n8n/webhook/abc?debug=1",
            relay.local_addr()
        ))
        .header("x-custom", "kept")
        .json(&json!({"message": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let echoed = read_json(response).await;
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["path"], "/webhook/abc");
    assert_eq!(echoed["query"], "debug=1");
    assert_eq!(echoed["custom"], "kept");
    assert_eq!(echoed["contentType"], "application/json");
    assert_eq!(echoed["body"], r#"{"message":"hi"}"#);

    relay.shutdown().await;
}

#[tokio::test]
async fn get_requests_carry_no_body_and_default_json_type() {
    let backend = start_backend().await;
    let relay = start_relay(format!("http://{backend}"), Some("/n8n")).await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/n8n/webhook/abc", relay.local_addr()))
        .send()
        .await
        .unwrap();

    let echoed = read_json(response).await;
    assert_eq!(echoed["method"], "GET");
    assert_eq!(echoed["body"], "");
    assert_eq!(echoed["contentType"], "application/json");

    relay.shutdown().await;
}

#[tokio::test]
async fn put_and_patch_carry_body() {
    let backend = start_backend().await;
    let relay = start_relay(format!("http://{backend}"), None).await;
    let client = reqwest::Client::new();

    for method in [Method::PUT, Method::PATCH] {
        let response = client
            .request(method.clone(), format!("http://{}/items/1", relay.local_addr()))
            .body("payload")
            .send()
            .await
            .unwrap();
        let echoed = read_json(response).await;
        assert_eq!(echoed["method"], method.as_str());
        assert_eq!(echoed["path"], "/items/1");
        assert_eq!(echoed["body"], "payload");
    }

    relay.shutdown().await;
}

#[tokio::test]
async fn backend_status_passes_through() {
    let backend = start_backend().await;
    let relay = start_relay(format!("http://{backend}"), Some("/n8n")).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/n8n/status/404", relay.local_addr()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(read_json(response).await["path"], "/status/404");

    relay.shutdown().await;
}

#[tokio::test]
async fn non_utf8_body_is_returned_byte_for_byte() {
    let backend = start_backend().await;
    let relay = start_relay(format!("http://{backend}"), Some("/n8n")).await;

    let response = reqwest::get(format!("http://{}/n8n/binary", relay.local_addr()))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(response.bytes().await.unwrap().as_ref(), BINARY_BODY);

    relay.shutdown().await;
}

#[tokio::test]
async fn unreachable_backend_returns_500_with_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let relay = start_relay(format!("http://{dead}"), Some("/n8n")).await;
    let response = reqwest::Client::new()
        .post(format!("http://{}/n8n/webhook/abc", relay.local_addr()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body = read_json(response).await;
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));

    relay.shutdown().await;
}

#[tokio::test]
async fn health_route() {
    let backend = start_backend().await;
    let relay = start_relay(format!("http://{backend}"), Some("/n8n")).await;

    let response = reqwest::get(format!("http://{}/healthz", relay.local_addr()))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(read_json(response).await, json!({"status": "healthy"}));

    relay.shutdown().await;
}

#[tokio::test]
async fn json_error_body_shape() {
    // The 500 body is a JSON object with a single `error` string.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let relay = start_relay(format!("http://{dead}"), None).await;
    let body: Value = reqwest::get(format!("http://{}/anything", relay.local_addr()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert!(object.contains_key("error"));

    relay.shutdown().await;
}
