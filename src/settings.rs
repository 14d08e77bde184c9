use crate::api::DEFAULT_BASE_URL;
use crate::json_store::JsonStore;
use crate::refresh::DEFAULT_REFRESH_INTERVAL_SECONDS;
use crate::state::StoreError;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const APP_DIR: &str = "minicloud";
const SETTINGS_FILE: &str = "settings.json";
const SESSION_FILE: &str = "session.json";

pub const KEY_BASE_URL: &str = "baseUrl";
pub const KEY_REFRESH_INTERVAL_SECONDS: &str = "refreshIntervalSeconds";
pub const KEY_SESSION_STORE: &str = "sessionStore";

pub const ENV_BASE_URL: &str = "MINICLOUD_BASE_URL";
pub const ENV_CONFIG_DIR: &str = "MINICLOUD_CONFIG_DIR";

fn defaults() -> HashMap<String, Value> {
  HashMap::from([
    (KEY_BASE_URL.to_string(), json!(DEFAULT_BASE_URL)),
    (
      KEY_REFRESH_INTERVAL_SECONDS.to_string(),
      json!(DEFAULT_REFRESH_INTERVAL_SECONDS),
    ),
    (KEY_SESSION_STORE.to_string(), json!("file")),
  ])
}

const KNOWN_KEYS: [&str; 3] = [KEY_BASE_URL, KEY_REFRESH_INTERVAL_SECONDS, KEY_SESSION_STORE];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStoreKind {
  File,
  Keyring,
  Memory,
}

impl FromStr for SessionStoreKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "file" => Ok(Self::File),
      "keyring" => Ok(Self::Keyring),
      "memory" => Ok(Self::Memory),
      other => Err(format!("unknown session store `{other}` (expected file, keyring or memory)")),
    }
  }
}

/// Directory holding settings and the file-backed session.
pub fn default_config_dir() -> Option<PathBuf> {
  if let Some(dir) = std::env::var_os(ENV_CONFIG_DIR).filter(|v| !v.is_empty()) {
    return Some(PathBuf::from(dir));
  }
  dirs::config_dir().map(|d| d.join(APP_DIR))
}

pub struct SettingsStore {
  store: JsonStore,
}

impl SettingsStore {
  pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
    Ok(Self {
      store: JsonStore::open(path, defaults())?,
    })
  }

  pub fn open_in(dir: &Path) -> Result<Self, StoreError> {
    Self::open(dir.join(SETTINGS_FILE))
  }

  pub fn path(&self) -> &Path {
    self.store.path()
  }

  /// The session document lives next to the settings file.
  pub fn session_file(&self) -> PathBuf {
    self
      .store
      .path()
      .parent()
      .map(|p| p.join(SESSION_FILE))
      .unwrap_or_else(|| PathBuf::from(SESSION_FILE))
  }

  pub fn get_u64(&self, key: &str, fallback: u64) -> u64 {
    self
      .store
      .get(key)
      .and_then(|v| v.as_u64())
      .unwrap_or(fallback)
  }

  pub fn get_string(&self, key: &str) -> Option<String> {
    let v = self.store.get(key)?;
    let s = v.as_str()?.trim();
    if s.is_empty() {
      None
    } else {
      Some(s.to_string())
    }
  }

  pub fn base_url(&self) -> String {
    self
      .get_string(KEY_BASE_URL)
      .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
  }

  pub fn refresh_interval_seconds(&self) -> u64 {
    self.get_u64(KEY_REFRESH_INTERVAL_SECONDS, DEFAULT_REFRESH_INTERVAL_SECONDS)
  }

  pub fn session_store_kind(&self) -> SessionStoreKind {
    match self.get_string(KEY_SESSION_STORE) {
      Some(value) => value.parse().unwrap_or_else(|err: String| {
        tracing::warn!(error = %err, "falling back to file session store");
        SessionStoreKind::File
      }),
      None => SessionStoreKind::File,
    }
  }

  /// Validates and stores a user-supplied value. Numbers are stored as
  /// numbers so the typed getters can read them back.
  pub fn set_from_str(&mut self, key: &str, raw: &str) -> Result<(), String> {
    let raw = raw.trim();
    let value = match key {
      KEY_BASE_URL => {
        crate::api::ApiClient::new(raw).map_err(|e| e.to_string())?;
        json!(raw.trim_end_matches('/'))
      }
      KEY_REFRESH_INTERVAL_SECONDS => {
        let secs: u64 = raw
          .parse()
          .map_err(|_| format!("{key} must be a whole number of seconds"))?;
        json!(secs)
      }
      KEY_SESSION_STORE => {
        raw.parse::<SessionStoreKind>()?;
        json!(raw.to_ascii_lowercase())
      }
      other => {
        return Err(format!(
          "unknown setting `{other}` (known: {})",
          KNOWN_KEYS.join(", ")
        ))
      }
    };
    self.store.set(key, value);
    Ok(())
  }

  pub fn remove(&mut self, key: &str) {
    self.store.delete(key);
  }

  pub fn entries(&self) -> Map<String, Value> {
    self.store.entries()
  }

  pub fn save(&self) -> Result<(), StoreError> {
    self.store.save()
  }
}
