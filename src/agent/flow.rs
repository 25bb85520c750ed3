//! Transfer parameter collection.
//!
//! A transfer needs a recipient and an amount. Once the workflow asks for a
//! transfer (or the user pastes a bare address), the next turns are consumed
//! locally until both values are valid. Nothing typed during collection is
//! sent to the workflow.

use crate::error::ValidationError;
use crate::wallet::{Address, Amount};

/// Prompt shown when a transfer flow starts.
pub const RECIPIENT_PROMPT: &str = "Please provide the recipient wallet address (0x...).";

/// Shown when the recipient is not a valid EVM address.
pub const INVALID_ADDRESS_MESSAGE: &str =
    "That does not look like a valid EVM address. Please enter a valid 0x... address.";

/// Amount prompt, e.g. "...Enter the amount in ETH (e.g. 0.05)."
pub fn amount_prompt(symbol: &str) -> String {
    format!("How much would you like to send? Enter the amount in {symbol} (e.g. 0.05).")
}

/// Shown when the amount is not a positive finite number.
pub fn invalid_amount_message(symbol: &str) -> String {
    format!("Please enter a valid positive number for the amount in {symbol}.")
}

/// Where the collection flow currently is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FlowState {
    /// No flow active; input goes to the workflow.
    #[default]
    Idle,
    /// Waiting for the recipient address.
    CollectingReceiver,
    /// Waiting for the amount to send to `receiver`.
    CollectingAmount { receiver: Address },
}

/// Validated parameters of a transfer, ready to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub receiver: Address,
    pub amount: Amount,
}

/// What one turn of input did to the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStep {
    /// Moved forward; show the prompt for the next value.
    Prompt(String),
    /// Input was rejected; state is unchanged.
    Rejected {
        error: ValidationError,
        message: String,
    },
    /// Both values collected; flow is back to idle.
    Ready(TransferRequest),
    /// Not consumed by the flow; send it to the workflow.
    Passthrough,
}

/// Single-slot transfer collection flow.
#[derive(Debug, Clone)]
pub struct TransferFlow {
    state: FlowState,
    symbol: String,
}

impl TransferFlow {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            state: FlowState::Idle,
            symbol: symbol.into(),
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != FlowState::Idle
    }

    /// Start collecting from scratch and return the recipient prompt.
    ///
    /// Any partially collected flow is replaced.
    pub fn begin_transfer(&mut self) -> String {
        if self.is_active() {
            tracing::debug!(state = ?self.state, "restarting transfer collection");
        }
        self.state = FlowState::CollectingReceiver;
        RECIPIENT_PROMPT.to_string()
    }

    /// Feed one trimmed line of user input through the flow.
    pub fn advance(&mut self, input: &str) -> FlowStep {
        let state = std::mem::take(&mut self.state);
        let (next, step) = transition(state, input, &self.symbol);
        self.state = next;
        step
    }
}

fn transition(state: FlowState, input: &str, symbol: &str) -> (FlowState, FlowStep) {
    match state {
        // A bare address skips the workflow and goes straight to the amount.
        FlowState::Idle => match Address::parse(input) {
            Ok(receiver) => (
                FlowState::CollectingAmount { receiver },
                FlowStep::Prompt(amount_prompt(symbol)),
            ),
            Err(_) => (FlowState::Idle, FlowStep::Passthrough),
        },
        FlowState::CollectingReceiver => match Address::parse(input) {
            Ok(receiver) => (
                FlowState::CollectingAmount { receiver },
                FlowStep::Prompt(amount_prompt(symbol)),
            ),
            Err(error) => (
                FlowState::CollectingReceiver,
                FlowStep::Rejected {
                    error,
                    message: INVALID_ADDRESS_MESSAGE.to_string(),
                },
            ),
        },
        FlowState::CollectingAmount { receiver } => match Amount::parse(input) {
            Ok(amount) => (
                FlowState::Idle,
                FlowStep::Ready(TransferRequest { receiver, amount }),
            ),
            Err(error) => (
                FlowState::CollectingAmount { receiver },
                FlowStep::Rejected {
                    error,
                    message: invalid_amount_message(symbol),
                },
            ),
        },
    }
}
