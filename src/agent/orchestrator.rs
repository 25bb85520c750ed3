//! Turn handling for one conversation.
//!
//! The orchestrator owns the session id, the transfer flow and the log.
//! Each call to [`Orchestrator::handle_input`] runs one complete turn; the
//! `&mut self` receiver keeps turns strictly sequential.

use std::sync::Arc;

use crate::agent::dispatcher::{ActionDispatcher, DispatchEffect};
use crate::agent::flow::{FlowState, FlowStep, TransferFlow};
use crate::agent::log::ConversationLog;
use crate::session::SessionId;
use crate::wallet::WalletProvider;
use crate::workflow::{NormalizedResponse, WorkflowClient, WorkflowRequest, normalize};

/// Shown when the workflow answers with a non-2xx status.
pub const WORKFLOW_HTTP_FAILED: &str = "Sorry, something went wrong while fetching the data.";

/// Shown when the workflow cannot be reached.
pub const WORKFLOW_UNREACHABLE: &str = "Sorry, there was an error contacting the server.";

pub struct Orchestrator {
    session_id: SessionId,
    workflow: Arc<dyn WorkflowClient>,
    dispatcher: ActionDispatcher,
    flow: TransferFlow,
    log: ConversationLog,
}

impl Orchestrator {
    /// New conversation with no wallet connected and ETH as native symbol.
    pub fn new(session_id: SessionId, workflow: Arc<dyn WorkflowClient>) -> Self {
        Self {
            session_id,
            workflow,
            dispatcher: ActionDispatcher::new(None, "ETH"),
            flow: TransferFlow::new("ETH"),
            log: ConversationLog::new(),
        }
    }

    pub fn with_wallet(mut self, wallet: Arc<dyn WalletProvider>) -> Self {
        self.dispatcher = self.dispatcher.with_wallet(wallet);
        self
    }

    /// Symbol used in prompts and confirmations (default `ETH`).
    pub fn with_native_symbol(mut self, symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        self.dispatcher = self.dispatcher.with_native_symbol(symbol.clone());
        self.flow = TransferFlow::new(symbol);
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn flow_state(&self) -> &FlowState {
        self.flow.state()
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Run one turn. Returns the assistant reply, or `None` for blank input.
    pub async fn handle_input(&mut self, input: &str) -> Option<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.log.push_user(trimmed);

        let reply = match self.flow.advance(trimmed) {
            FlowStep::Prompt(prompt) => prompt,
            FlowStep::Rejected { error, message } => {
                tracing::debug!("transfer input rejected: {}", error);
                message
            }
            FlowStep::Ready(request) => self.dispatcher.transfer(&request).await,
            FlowStep::Passthrough => self.ask_workflow(trimmed).await,
        };

        self.log.push_assistant(reply.clone());
        Some(reply)
    }

    async fn ask_workflow(&mut self, message: &str) -> String {
        let request = WorkflowRequest {
            message: message.to_string(),
            session_id: self.session_id.to_string(),
            wallet_address: self.dispatcher.wallet_address(),
        };

        let response = match self.workflow.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Error sending to workflow: {}", e);
                return WORKFLOW_UNREACHABLE.to_string();
            }
        };
        if !response.is_success() {
            tracing::error!(status = response.status, "Workflow request failed");
            return WORKFLOW_HTTP_FAILED.to_string();
        }

        match normalize(&response.body, &response.content_type) {
            NormalizedResponse::Reply { text } => text,
            NormalizedResponse::Instruction { instruction, .. } => {
                match self.dispatcher.dispatch(&instruction).await {
                    DispatchEffect::Reply(text) => text,
                    DispatchEffect::BeginTransferFlow => self.flow.begin_transfer(),
                }
            }
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("session_id", &self.session_id)
            .field("dispatcher", &self.dispatcher)
            .field("flow", &self.flow)
            .field("turns", &self.log.len())
            .finish()
    }
}
