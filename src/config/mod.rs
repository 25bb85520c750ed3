//! Configuration for walletchat.
//!
//! Everything comes from env vars. `./.env` and `~/.walletchat/.env` are
//! loaded via dotenvy early in startup; explicit env vars always win.

pub(crate) mod helpers;
mod relay;

use std::path::PathBuf;

use crate::config::helpers::{optional_env, parse_optional_env, validate_http_url};
use crate::error::ConfigError;
use crate::wallet::Address;

pub use self::relay::RelayConfig;

/// Main configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub workflow: WorkflowConfig,
    /// `None` when no wallet is connected.
    pub wallet: Option<WalletConfig>,
    pub session: SessionConfig,
    pub relay: RelayConfig,
}

/// Where chat messages are posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub base_url: String,
    pub webhook_path: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8787".to_string(),
            webhook_path: "/n8n/webhook/19d65c4d-703a-426f-b6ff-b76b94a6493a".to_string(),
        }
    }
}

impl WorkflowConfig {
    /// Full URL of the webhook.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.webhook_path.trim_start_matches('/')
        )
    }

    fn resolve() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let base_url = optional_env("WORKFLOW_BASE_URL")?.unwrap_or(defaults.base_url);
        validate_http_url("WORKFLOW_BASE_URL", &base_url)?;
        Ok(Self {
            base_url,
            webhook_path: optional_env("WORKFLOW_WEBHOOK_PATH")?.unwrap_or(defaults.webhook_path),
        })
    }
}

/// Largest accepted `WALLET_DECIMALS`.
pub const MAX_DECIMALS: u32 = 30;

/// Connected wallet, reached over JSON-RPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConfig {
    pub rpc_url: String,
    pub address: Address,
    pub native_symbol: String,
    pub decimals: u32,
}

impl WalletConfig {
    fn resolve() -> Result<Option<Self>, ConfigError> {
        let rpc_url = optional_env("WALLET_RPC_URL")?;
        let address = optional_env("WALLET_ADDRESS")?;

        let (rpc_url, address) = match (rpc_url, address) {
            (None, None) => return Ok(None),
            (Some(rpc_url), Some(address)) => (rpc_url, address),
            (Some(_), None) => {
                return Err(ConfigError::MissingRequired {
                    key: "WALLET_ADDRESS".to_string(),
                    hint: "Set the connected account address alongside WALLET_RPC_URL.".to_string(),
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingRequired {
                    key: "WALLET_RPC_URL".to_string(),
                    hint: "Set the JSON-RPC endpoint that manages WALLET_ADDRESS.".to_string(),
                });
            }
        };

        validate_http_url("WALLET_RPC_URL", &rpc_url)?;
        let address = Address::parse(&address).map_err(|e| ConfigError::InvalidValue {
            key: "WALLET_ADDRESS".to_string(),
            message: e.to_string(),
        })?;

        let decimals = parse_optional_env("WALLET_DECIMALS", 18u32)?;
        if decimals > MAX_DECIMALS {
            return Err(ConfigError::InvalidValue {
                key: "WALLET_DECIMALS".to_string(),
                message: format!("{decimals} is out of range (0-{MAX_DECIMALS})"),
            });
        }

        Ok(Some(Self {
            rpc_url,
            address,
            native_symbol: native_symbol()?,
            decimals,
        }))
    }
}

fn native_symbol() -> Result<String, ConfigError> {
    Ok(optional_env("WALLET_NATIVE_SYMBOL")?.unwrap_or_else(|| "ETH".to_string()))
}

/// Session identity storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// File that keeps the session id across runs. In-memory when unset.
    pub session_file: Option<PathBuf>,
}

impl SessionConfig {
    fn resolve() -> Result<Self, ConfigError> {
        Ok(Self {
            session_file: optional_env("CHAT_SESSION_FILE")?.map(PathBuf::from),
        })
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Loads `./.env` and then `~/.walletchat/.env`; dotenvy never overwrites
    /// vars that are already set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        crate::bootstrap::load_walletchat_env();
        Self::resolve()
    }

    /// Build from the current process environment without touching `.env` files.
    pub fn resolve() -> Result<Self, ConfigError> {
        Ok(Self {
            workflow: WorkflowConfig::resolve()?,
            wallet: WalletConfig::resolve()?,
            session: SessionConfig::resolve()?,
            relay: RelayConfig::resolve()?,
        })
    }

    /// Native currency symbol, also used when no wallet is connected.
    pub fn native_symbol(&self) -> String {
        self.wallet
            .as_ref()
            .map(|wallet| wallet.native_symbol.clone())
            .unwrap_or_else(|| native_symbol().unwrap_or_else(|_| "ETH".to_string()))
    }
}
