//! Chat core: transfer collection, action dispatch and the turn loop.

pub mod dispatcher;
pub mod flow;
pub mod log;
mod orchestrator;

pub use dispatcher::{ActionDispatcher, DispatchEffect};
pub use flow::{FlowState, FlowStep, TransferFlow, TransferRequest};
pub use log::{ConversationLog, ConversationTurn, Role, render_paragraphs};
pub use orchestrator::{Orchestrator, WORKFLOW_HTTP_FAILED, WORKFLOW_UNREACHABLE};
