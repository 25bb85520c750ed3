//! Remote automation workflow client.
//!
//! Chat text goes to a webhook as `{message, sessionId, walletAddress}`.
//! What comes back is loosely typed; see [`normalize`] for how it is read.

pub mod normalize;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use crate::config::WorkflowConfig;
use crate::error::WorkflowError;

pub use normalize::{ActionInstruction, ActionKind, NO_RESPONSE, NormalizedResponse, normalize};

/// Body posted to the workflow webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRequest {
    pub message: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

/// Raw workflow response. The body is kept as text until normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowHttpResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl WorkflowHttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport to the remote workflow.
#[async_trait]
pub trait WorkflowClient: Send + Sync {
    /// Post one chat message. Any HTTP status is a successful exchange;
    /// only transport failures are errors.
    async fn send(&self, request: &WorkflowRequest) -> Result<WorkflowHttpResponse, WorkflowError>;
}

/// [`WorkflowClient`] that posts JSON over HTTP.
pub struct HttpWorkflowClient {
    client: Client,
    endpoint: String,
}

impl HttpWorkflowClient {
    pub fn new(config: &WorkflowConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("walletchat/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| Client::new()),
            endpoint: config.endpoint(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl WorkflowClient for HttpWorkflowClient {
    async fn send(&self, request: &WorkflowRequest) -> Result<WorkflowHttpResponse, WorkflowError> {
        tracing::debug!(
            url = %self.endpoint,
            session_id = %request.session_id,
            wallet = request.wallet_address.is_some(),
            "posting message to workflow"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| WorkflowError::RequestFailed {
                url: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .text()
            .await
            .map_err(|e| WorkflowError::Body(e.to_string()))?;

        tracing::debug!(status = status.as_u16(), content_type = %content_type, "workflow responded");

        Ok(WorkflowHttpResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}
