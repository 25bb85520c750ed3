//! Wallet provider seam.
//!
//! The orchestrator never talks to a chain directly. Everything it needs
//! from the connected wallet goes through [`WalletProvider`].

pub mod address;
pub mod amount;
pub mod rpc;

use async_trait::async_trait;
use serde::Serialize;

pub use address::{Address, is_valid_address};
pub use amount::{Amount, format_units};
pub use rpc::JsonRpcWallet;

use crate::error::WalletError;

/// Balance reported by the wallet, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletBalance {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// Operations the chat runtime needs from a connected wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Address of the connected account.
    fn address(&self) -> &Address;

    /// Current native balance. Never cached by callers.
    async fn balance(&self) -> Result<WalletBalance, WalletError>;

    /// Whether the wallet can sign and submit transactions right now.
    async fn can_sign(&self) -> bool;

    /// Submit a native value transfer and return the transaction hash.
    async fn send_transaction(&self, to: &Address, amount: &Amount)
    -> Result<String, WalletError>;
}
