//! Ethereum JSON-RPC wallet provider.
//!
//! Talks to a node (or wallet daemon) that manages the connected account's
//! keys: `eth_getBalance` for balances, `eth_accounts` to decide whether the
//! account is unlocked for signing, `eth_sendTransaction` to submit.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::wallet::{Address, Amount, WalletBalance, WalletProvider, format_units};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Wallet provider backed by a JSON-RPC endpoint.
pub struct JsonRpcWallet {
    client: Client,
    rpc_url: String,
    address: Address,
    symbol: String,
    decimals: u32,
    next_id: AtomicU64,
}

impl JsonRpcWallet {
    pub fn new(config: &WalletConfig) -> Self {
        Self {
            client: Client::new(),
            rpc_url: config.rpc_url.clone(),
            address: config.address.clone(),
            symbol: config.native_symbol.clone(),
            decimals: config.decimals,
            next_id: AtomicU64::new(1),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        tracing::debug!(method, url = %self.rpc_url, "wallet rpc call");
        let response = self.client.post(&self.rpc_url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WalletError::Rpc {
                method: method.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let body: RpcResponse = response.json().await?;
        if let Some(err) = body.error {
            return Err(WalletError::RpcRejected {
                method: method.to_string(),
                code: err.code,
                message: err.message,
            });
        }
        body.result.ok_or_else(|| WalletError::Rpc {
            method: method.to_string(),
            reason: "response is missing a result".to_string(),
        })
    }
}

/// Parse a JSON-RPC hex quantity such as `"0x1bc16d674ec80000"`.
fn parse_quantity(method: &str, value: &Value) -> Result<u128, WalletError> {
    let bad = |reason: String| WalletError::Rpc {
        method: method.to_string(),
        reason,
    };
    let raw = value
        .as_str()
        .ok_or_else(|| bad(format!("expected hex quantity, got {}", value)))?;
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| bad(format!("quantity '{}' is missing 0x prefix", raw)))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16).map_err(|e| bad(format!("invalid quantity '{}': {}", raw, e)))
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    fn address(&self) -> &Address {
        &self.address
    }

    async fn balance(&self) -> Result<WalletBalance, WalletError> {
        let method = "eth_getBalance";
        let result = self
            .call(method, json!([self.address.as_str(), "latest"]))
            .await?;
        let units = parse_quantity(method, &result)?;
        Ok(WalletBalance {
            value: format_units(units, self.decimals),
            symbol: Some(self.symbol.clone()),
        })
    }

    async fn can_sign(&self) -> bool {
        match self.call("eth_accounts", json!([])).await {
            Ok(Value::Array(accounts)) => accounts.iter().filter_map(Value::as_str).any(|account| {
                account.eq_ignore_ascii_case(self.address.as_str())
            }),
            Ok(other) => {
                tracing::warn!("eth_accounts returned a non-array result: {}", other);
                false
            }
            Err(e) => {
                tracing::warn!("Signing capability check failed: {}", e);
                false
            }
        }
    }

    async fn send_transaction(
        &self,
        to: &Address,
        amount: &Amount,
    ) -> Result<String, WalletError> {
        let method = "eth_sendTransaction";
        let value = amount.to_base_units(self.decimals)?;
        let result = self
            .call(
                method,
                json!([{
                    "from": self.address.as_str(),
                    "to": to.as_str(),
                    "value": format!("{:#x}", value),
                }]),
            )
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WalletError::Rpc {
                method: method.to_string(),
                reason: format!("expected transaction hash, got {}", result),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(
            parse_quantity("eth_getBalance", &json!("0x1bc16d674ec80000")).unwrap(),
            2_000_000_000_000_000_000
        );
        assert_eq!(parse_quantity("eth_getBalance", &json!("0x0")).unwrap(), 0);
        assert_eq!(parse_quantity("eth_getBalance", &json!("0x")).unwrap(), 0);
    }

    #[test]
    fn rejects_malformed_quantities() {
        assert!(parse_quantity("eth_getBalance", &json!("12")).is_err());
        assert!(parse_quantity("eth_getBalance", &json!("0xzz")).is_err());
        assert!(parse_quantity("eth_getBalance", &json!(12)).is_err());
    }

    #[test]
    fn request_envelope_shape() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "eth_accounts",
            params: json!([]),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"jsonrpc": "2.0", "id": 7, "method": "eth_accounts", "params": []})
        );
    }
}
