//! Workflow relay.
//!
//! A stateless HTTP proxy that lets the chat client reach a workflow backend
//! through one local origin. Every path and method is forwarded to the
//! backend after an optional mount prefix is removed; the backend's status
//! and body come back unchanged, always labelled as JSON.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, OriginalUri, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::error::RelayError;

/// Headers that describe the incoming connection rather than the request.
const SKIPPED_HEADERS: &[&str] = &[
    "host",
    "content-length",
    "connection",
    "transfer-encoding",
    "keep-alive",
    "upgrade",
    "proxy-connection",
    "te",
    "trailer",
    "accept-encoding",
];

/// Shared relay state.
#[derive(Debug, Clone)]
pub struct RelayState {
    client: reqwest::Client,
    backend_url: String,
    strip_prefix: Option<String>,
}

impl RelayState {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let parsed =
            url::Url::parse(&config.backend_url).map_err(|e| RelayError::InvalidBackend {
                url: config.backend_url.clone(),
                reason: e.to_string(),
            })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RelayError::InvalidBackend {
                url: config.backend_url.clone(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("walletchat-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RelayError::StartupFailed {
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            backend_url: config.backend_url.trim_end_matches('/').to_string(),
            strip_prefix: config.strip_prefix.clone(),
        })
    }

    /// Backend URL for an incoming path and optional query string.
    ///
    /// The prefix is only removed on a segment boundary, so `/n8n` strips
    /// `/n8n/webhook` but not `/n8nx`.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let rest = match &self.strip_prefix {
            Some(prefix) => match path.strip_prefix(prefix.as_str()) {
                Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
                _ => path,
            },
            None => path,
        };
        let rest = if rest.is_empty() { "/" } else { rest };

        match query {
            Some(query) if !query.is_empty() => format!("{}{}?{}", self.backend_url, rest, query),
            _ => format!("{}{}", self.backend_url, rest),
        }
    }
}

/// Handle to a running relay.
pub struct RelayHandle {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RelayHandle {
    /// Bound address (useful when binding to port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            tracing::error!("Relay task failed: {}", e);
        }
    }
}

/// Build the relay router.
pub fn router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .fallback(proxy_handler)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB max request body
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the relay HTTP server.
pub async fn start_server(
    addr: SocketAddr,
    state: Arc<RelayState>,
) -> Result<RelayHandle, RelayError> {
    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| RelayError::StartupFailed {
                reason: format!("Failed to bind to {}: {}", addr, e),
            })?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| RelayError::StartupFailed {
            reason: format!("Failed to get local addr: {}", e),
        })?;

    let app = router(state);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Relay shutting down");
            })
            .await
        {
            tracing::error!("Relay server error: {}", e);
        }
    });

    tracing::info!("Relay listening on {}", local_addr);
    Ok(RelayHandle {
        local_addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

#[derive(Debug, Serialize)]
struct RelayErrorBody {
    error: String,
}

async fn proxy_handler(
    State(state): State<Arc<RelayState>>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let target = state.target_url(uri.path(), uri.query());
    tracing::debug!(%method, path = uri.path(), %target, "relaying request");

    let mut request = state
        .client
        .request(method.clone(), &target)
        .headers(forwarded_headers(&headers));
    if carries_body(&method) {
        request = request.body(body);
    }

    let result = match request.send().await {
        Ok(response) => {
            let status = response.status();
            response.bytes().await.map(|body| (status, body))
        }
        Err(e) => Err(e),
    };

    match result {
        Ok((status, body)) => {
            tracing::debug!(status = status.as_u16(), %target, "backend responded");
            (
                status,
                [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                body,
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!(%target, "Relay request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RelayErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Incoming headers minus connection-level ones. JSON is the content type
/// unless the caller sent its own.
fn forwarded_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    for (name, value) in incoming {
        if is_skipped(name) {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    if !forwarded.contains_key(header::CONTENT_TYPE) {
        forwarded.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }
    forwarded
}

fn is_skipped(name: &HeaderName) -> bool {
    SKIPPED_HEADERS.contains(&name.as_str())
}
