use crate::json_store::JsonStore;
use crate::types::Session;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

pub const KEY_AUTH_TOKEN: &str = "authToken";
pub const KEY_CURRENT_USER: &str = "currentUser";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("OS keychain/secret service is unavailable: {0}")]
    Keyring(String),
}

/// Persistent home of the session pair. Implementations write and clear
/// token and identity together; a load that finds only one half reports no
/// session and removes the leftover.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>, StoreError>;
    fn save(&self, session: &Session) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

pub(crate) enum StoredPair {
    Empty,
    Partial,
    Complete(Session),
}

pub(crate) fn classify_pair(token: Option<String>, user: Option<String>) -> StoredPair {
    match (non_empty(token), non_empty(user)) {
        (Some(token), Some(email)) => StoredPair::Complete(Session::new(token, email)),
        (None, None) => StoredPair::Empty,
        _ => StoredPair::Partial,
    }
}

/// Process-local store; nothing survives a restart.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: &Session) -> Self {
        let store = Self::new();
        store.insert(KEY_AUTH_TOKEN, &session.token);
        store.insert(KEY_CURRENT_USER, &session.email);
        store
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Writes a single raw entry, bypassing the pair discipline.
    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let pair = classify_pair(
            guard.get(KEY_AUTH_TOKEN).cloned(),
            guard.get(KEY_CURRENT_USER).cloned(),
        );
        match pair {
            StoredPair::Complete(session) => Ok(Some(session)),
            StoredPair::Empty => Ok(None),
            StoredPair::Partial => {
                guard.remove(KEY_AUTH_TOKEN);
                guard.remove(KEY_CURRENT_USER);
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(KEY_AUTH_TOKEN.to_string(), session.token.clone());
        guard.insert(KEY_CURRENT_USER.to_string(), session.email.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.remove(KEY_AUTH_TOKEN);
        guard.remove(KEY_CURRENT_USER);
        Ok(())
    }
}

/// Session pair kept in a JSON document (`authToken`, `currentUser`).
/// Each save or clear replaces the whole document in one rename.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self) -> Result<JsonStore, StoreError> {
        JsonStore::open(&self.path, HashMap::new())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        let store = self.open()?;
        let read = |key: &str| store.get(key).and_then(|v| v.as_str()).map(str::to_string);
        match classify_pair(read(KEY_AUTH_TOKEN), read(KEY_CURRENT_USER)) {
            StoredPair::Complete(session) => Ok(Some(session)),
            StoredPair::Empty => Ok(None),
            StoredPair::Partial => {
                tracing::warn!(path = %self.path.display(), "discarding incomplete stored session");
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        let mut store = self.open()?;
        store.set(KEY_AUTH_TOKEN, session.token.clone());
        store.set(KEY_CURRENT_USER, session.email.clone());
        store.save()
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut store = self.open()?;
        let removed_token = store.delete(KEY_AUTH_TOKEN);
        let removed_user = store.delete(KEY_CURRENT_USER);
        if removed_token || removed_user {
            store.save()?;
        }
        Ok(())
    }
}
