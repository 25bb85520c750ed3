use std::env::VarError;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::ConfigError;

/// Read an env var, treating unset and blank values the same way.
///
/// Surrounding quotes left behind by hand-edited `.env` files are stripped.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => {
            let value = unquote(&value);
            if value.is_empty() {
                Ok(None)
            } else {
                Ok(Some(value))
            }
        }
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "value is not valid UTF-8".to_string(),
        }),
    }
}

/// Parse an optional env var into `T`, falling back to `default` when unset.
pub(crate) fn parse_optional_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    optional_env(key)?
        .map(|s| s.parse::<T>())
        .transpose()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
        .map(|value| value.unwrap_or(default))
}

/// Reject anything that is not an absolute http(s) URL.
pub(crate) fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("must be an absolute URL: {e}"),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("scheme '{}' is not http or https", parsed.scheme()),
        });
    }
    Ok(())
}

fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    let maybe_unquoted = trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .or_else(|| {
            trimmed
                .strip_prefix('\'')
                .and_then(|inner| inner.strip_suffix('\''))
        })
        .unwrap_or(trimmed);
    maybe_unquoted.trim().to_string()
}

#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
