use crate::config::helpers::{optional_env, parse_optional_env, validate_http_url};
use crate::error::ConfigError;

/// Relay (workflow proxy) configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Base URL every request is forwarded to.
    pub backend_url: String,
    /// Mount prefix removed from the incoming path before forwarding.
    pub strip_prefix: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            backend_url: "http://localhost:5678".to_string(),
            strip_prefix: Some("/n8n".to_string()),
        }
    }
}

impl RelayConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend_url = optional_env("RELAY_BACKEND_URL")?.unwrap_or(defaults.backend_url);
        validate_http_url("RELAY_BACKEND_URL", &backend_url)?;

        let strip_prefix = match optional_env("RELAY_STRIP_PREFIX")? {
            Some(prefix) if prefix == "/" || prefix.eq_ignore_ascii_case("none") => None,
            Some(prefix) => Some(normalize_prefix(&prefix)),
            None => defaults.strip_prefix,
        };

        Ok(Self {
            host: optional_env("RELAY_HOST")?.unwrap_or(defaults.host),
            port: parse_optional_env("RELAY_PORT", defaults.port)?,
            backend_url,
            strip_prefix,
        })
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
