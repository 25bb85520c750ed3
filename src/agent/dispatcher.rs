//! Runs workflow instructions against the connected wallet.
//!
//! Every outcome is a message for the user. Wallet errors are logged and
//! replaced with fixed wording; nothing here fails the turn.

use std::sync::Arc;

use crate::agent::flow::TransferRequest;
use crate::wallet::WalletProvider;
use crate::workflow::{ActionInstruction, ActionKind};

/// Shown when the balance cannot be read.
pub const BALANCE_UNAVAILABLE: &str = "Balance unavailable";

/// Shown when no wallet can sign.
pub const WALLET_NOT_READY: &str = "Wallet not ready for sending transactions.";

/// Shown when submission fails for any reason.
pub const SEND_FAILED: &str = "Failed to send transaction. Please try again.";

/// What the orchestrator should do with a dispatched instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEffect {
    /// Show this text.
    Reply(String),
    /// Start collecting transfer parameters.
    BeginTransferFlow,
}

/// Executes recognized actions through an optional wallet.
#[derive(Clone)]
pub struct ActionDispatcher {
    wallet: Option<Arc<dyn WalletProvider>>,
    native_symbol: String,
}

impl ActionDispatcher {
    pub fn new(wallet: Option<Arc<dyn WalletProvider>>, native_symbol: impl Into<String>) -> Self {
        Self {
            wallet,
            native_symbol: native_symbol.into(),
        }
    }

    pub fn with_wallet(mut self, wallet: Arc<dyn WalletProvider>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn with_native_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.native_symbol = symbol.into();
        self
    }

    pub fn native_symbol(&self) -> &str {
        &self.native_symbol
    }

    /// Address of the connected wallet, if any.
    pub fn wallet_address(&self) -> Option<String> {
        self.wallet
            .as_ref()
            .map(|wallet| wallet.address().as_str().to_string())
    }

    pub async fn dispatch(&self, instruction: &ActionInstruction) -> DispatchEffect {
        tracing::debug!(
            action = instruction.action(),
            fields = ?instruction.fields().keys().collect::<Vec<_>>(),
            "dispatching workflow instruction"
        );
        match instruction.kind() {
            ActionKind::CheckBalance => DispatchEffect::Reply(self.check_balance().await),
            ActionKind::Transfer => DispatchEffect::BeginTransferFlow,
        }
    }

    /// Current balance as `"<value> <symbol>"`, or [`BALANCE_UNAVAILABLE`].
    pub async fn check_balance(&self) -> String {
        let Some(wallet) = &self.wallet else {
            return BALANCE_UNAVAILABLE.to_string();
        };
        match wallet.balance().await {
            Ok(balance) => {
                let symbol = balance.symbol.as_deref().unwrap_or(&self.native_symbol);
                format!("{} {}", balance.value, symbol)
            }
            Err(e) => {
                tracing::warn!("Failed to fetch wallet balance: {}", e);
                BALANCE_UNAVAILABLE.to_string()
            }
        }
    }

    /// Submit a collected transfer and describe the result.
    pub async fn transfer(&self, request: &TransferRequest) -> String {
        let Some(wallet) = &self.wallet else {
            return WALLET_NOT_READY.to_string();
        };
        if !wallet.can_sign().await {
            tracing::info!(address = %wallet.address(), "wallet cannot sign, transfer skipped");
            return WALLET_NOT_READY.to_string();
        }

        match wallet
            .send_transaction(&request.receiver, &request.amount)
            .await
        {
            Ok(hash) => {
                tracing::info!(to = %request.receiver, amount = %request.amount, tx = %hash, "transfer submitted");
                format!(
                    "Sent {} {} to {}. Tx: {}",
                    request.amount, self.native_symbol, request.receiver, hash
                )
            }
            Err(e) => {
                tracing::error!("Failed to send transaction: {}", e);
                SEND_FAILED.to_string()
            }
        }
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("wallet", &self.wallet_address())
            .field("native_symbol", &self.native_symbol)
            .finish()
    }
}
