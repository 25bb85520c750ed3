//! HTTP workflow client against a local axum webhook.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use walletchat::agent::{Orchestrator, WORKFLOW_HTTP_FAILED, WORKFLOW_UNREACHABLE};
use walletchat::config::WorkflowConfig;
use walletchat::session::SessionId;
use walletchat::workflow::{HttpWorkflowClient, WorkflowClient, WorkflowRequest};

const WEBHOOK_PATH: &str = "/webhook/test-flow";

#[derive(Clone, Default)]
struct Captured {
    bodies: Arc<Mutex<Vec<Value>>>,
    content_types: Arc<Mutex<Vec<String>>>,
}

async fn webhook(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    captured.content_types.lock().unwrap().push(
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
    );
    let message = body["message"].as_str().unwrap_or_default().to_string();
    captured.bodies.lock().unwrap().push(body);

    match message.as_str() {
        "fail" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "text" => (
            [(header::CONTENT_TYPE, "text/plain")],
            "Plain words from the workflow",
        )
            .into_response(),
        "balance" => Json(json!([{ "output": "```json\n{\"action\":\"check_balance\"}\n```" }]))
            .into_response(),
        other => Json(json!([{ "output": format!("echo: {other}") }])).into_response(),
    }
}

async fn start_webhook() -> (SocketAddr, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route(WEBHOOK_PATH, post(webhook))
        .with_state(captured.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, captured)
}

fn config_for(addr: SocketAddr) -> WorkflowConfig {
    WorkflowConfig {
        base_url: format!("http://{addr}"),
        webhook_path: WEBHOOK_PATH.to_string(),
    }
}

#[tokio::test]
async fn posts_json_body_with_camel_case_keys() {
    let (addr, captured) = start_webhook().await;
    let client = HttpWorkflowClient::new(&config_for(addr));

    let response = client
        .send(&WorkflowRequest {
            message: "hello".to_string(),
            session_id: "session-1".to_string(),
            wallet_address: Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string()),
        })
        .await
        .unwrap();

    assert!(response.is_success());
    assert!(response.content_type.contains("application/json"));
    assert_eq!(
        captured.bodies.lock().unwrap()[0],
        json!({
            "message": "hello",
            "sessionId": "session-1",
            "walletAddress": "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        })
    );
    assert_eq!(
        captured.content_types.lock().unwrap()[0],
        "application/json"
    );
}

#[tokio::test]
async fn orchestrator_over_http() {
    let (addr, captured) = start_webhook().await;
    let workflow = Arc::new(HttpWorkflowClient::new(&config_for(addr)));
    let session_id = SessionId::parse("fixed-session").unwrap();
    let mut chat = Orchestrator::new(session_id, workflow);

    assert_eq!(chat.handle_input("hi").await.as_deref(), Some("echo: hi"));
    assert_eq!(
        chat.handle_input("text").await.as_deref(),
        Some("Plain words from the workflow")
    );
    assert_eq!(
        chat.handle_input("fail").await.as_deref(),
        Some(WORKFLOW_HTTP_FAILED)
    );
    // Fenced instruction, but no wallet is connected.
    assert_eq!(
        chat.handle_input("balance").await.as_deref(),
        Some("Balance unavailable")
    );

    let bodies = captured.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 4);
    assert!(bodies.iter().all(|b| b["sessionId"] == "fixed-session"));
    assert!(bodies.iter().all(|b| b.get("walletAddress").is_none()));
}

#[tokio::test]
async fn unreachable_workflow_is_reported() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let workflow = Arc::new(HttpWorkflowClient::new(&config_for(addr)));
    let mut chat = Orchestrator::new(SessionId::generate(), workflow);
    assert_eq!(
        chat.handle_input("hello").await.as_deref(),
        Some(WORKFLOW_UNREACHABLE)
    );
}
