//! Bootstrap helpers for walletchat.
//!
//! Env vars can live in `~/.walletchat/.env` so the wallet and workflow
//! endpoints do not have to be exported in every shell.
//!
//! File: `~/.walletchat/.env` (standard dotenvy format)

use std::path::{Path, PathBuf};

/// Base directory for walletchat state: `~/.walletchat`.
pub fn walletchat_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".walletchat")
}

/// Path to the walletchat-specific `.env` file: `~/.walletchat/.env`.
pub fn walletchat_env_path() -> PathBuf {
    walletchat_dir().join(".env")
}

/// REPL line history: `~/.walletchat/history`.
pub fn history_path() -> PathBuf {
    walletchat_dir().join("history")
}

/// Load env vars from `~/.walletchat/.env` (in addition to the standard `.env`).
///
/// Call this **after** `dotenvy::dotenv()` so that the standard `./.env`
/// takes priority. dotenvy never overwrites existing env vars, so the
/// effective priority is:
///
///   explicit env vars > `./.env` > `~/.walletchat/.env`
pub fn load_walletchat_env() {
    load_env_file(&walletchat_env_path());
}

/// Load a dotenv file if it exists. Returns how many vars it declared.
pub fn load_env_file(path: &Path) -> usize {
    if !path.exists() {
        return 0;
    }
    match dotenvy::from_path_iter(path) {
        Ok(iter) => {
            let count = iter.filter(|item| item.is_ok()).count();
            if let Err(e) = dotenvy::from_path(path) {
                tracing::warn!("Failed to load {}: {}", path.display(), e);
                return 0;
            }
            count
        }
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            0
        }
    }
}
