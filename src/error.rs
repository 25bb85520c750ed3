//! Error types for walletchat.

/// Top-level error type for the chat runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Terminal error: {0}")]
    Terminal(String),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures talking to the remote automation workflow.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Workflow request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Failed to read workflow response body: {0}")]
    Body(String),
}

/// Wallet provider errors.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Wallet RPC {method} failed: {reason}")]
    Rpc { method: String, reason: String },

    #[error("Wallet RPC {method} returned error {code}: {message}")]
    RpcRejected {
        method: String,
        code: i64,
        message: String,
    },

    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Relay server errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Relay failed to start: {reason}")]
    StartupFailed { reason: String },

    #[error("Invalid backend URL {url}: {reason}")]
    InvalidBackend { url: String, reason: String },
}

/// User input rejected while collecting transfer parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid EVM address")]
    InvalidAddress(String),

    #[error("'{0}' is not a positive finite amount")]
    InvalidAmount(String),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
