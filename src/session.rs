//! Conversation session identity.
//!
//! Every message sent to the workflow carries the same session id for the
//! lifetime of a chat session. The id is reused from a [`SessionStore`] when
//! one is already recorded there, otherwise a fresh one is generated and
//! written back. Storage failures never stop the chat; the id just stays
//! in memory.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

/// Key the session id is stored under.
pub const SESSION_STORAGE_KEY: &str = "chatSessionId";

/// Opaque, non-empty conversation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Accept a stored id. Blank values are rejected so they get regenerated.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Generate a new random id.
    ///
    /// Uses an OS-backed UUIDv4 and falls back to a base-36 string from a
    /// clock-seeded RNG when the OS source is unavailable.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        match OsRng.try_fill_bytes(&mut bytes) {
            Ok(()) => Self(
                uuid::Builder::from_random_bytes(bytes)
                    .into_uuid()
                    .to_string(),
            ),
            Err(e) => {
                tracing::warn!("Secure random source unavailable, using fallback id: {}", e);
                Self::fallback(fallback_seed())
            }
        }
    }

    /// Id derived from `seed` without touching the OS random source.
    fn fallback(seed: u64) -> Self {
        Self(to_base36(StdRng::seed_from_u64(seed).r#gen::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn fallback_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default();
    nanos ^ (u64::from(std::process::id()) << 32)
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Storage for a single session id value.
pub trait SessionStore: Send + Sync {
    /// Stored id, if any.
    fn load(&self) -> io::Result<Option<String>>;

    /// Replace the stored id.
    fn save(&self, id: &str) -> io::Result<()>;
}

/// Process-scoped store. The id lives as long as the process does.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    value: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> io::Result<Option<String>> {
        let guard = self
            .value
            .lock()
            .map_err(|_| io::Error::other("session store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, id: &str) -> io::Result<()> {
        let mut guard = self
            .value
            .lock()
            .map_err(|_| io::Error::other("session store lock poisoned"))?;
        *guard = Some(id.to_string());
        Ok(())
    }
}

/// JSON file store: `{"chatSessionId": "..."}`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> io::Result<Option<String>> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let value: serde_json::Value = serde_json::from_str(&data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(value
            .get(SESSION_STORAGE_KEY)
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }

    fn save(&self, id: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&serde_json::json!({ (SESSION_STORAGE_KEY): id }))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, json)?;
        tracing::debug!("Session id saved to {}", self.path.display());
        Ok(())
    }
}

/// Return the stored session id, generating and persisting one if needed.
///
/// Never fails: a store that cannot be read or written yields an id that
/// only lives in memory.
pub fn get_or_create_session_id(store: &dyn SessionStore) -> SessionId {
    match store.load() {
        Ok(Some(existing)) => {
            if let Some(id) = SessionId::parse(&existing) {
                return id;
            }
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!("Failed to read session id, using an in-memory id: {}", e);
            return SessionId::generate();
        }
    }

    let id = SessionId::generate();
    if let Err(e) = store.save(id.as_str()) {
        tracing::warn!("Failed to persist session id: {}", e);
    }
    id
}
