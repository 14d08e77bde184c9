use super::{FileSessionStore, KeyringSessionStore, MemorySessionStore, SessionManager, SessionStore};
use crate::api::ApiClient;
use crate::error::ClientError;
use crate::files::FileService;
use crate::refresh::refresh_interval;
use crate::settings::{default_config_dir, SessionStoreKind, SettingsStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Picks the persistence backend for the session pair. An unusable keychain
/// falls back to the file store next to the settings.
pub fn open_session_store(kind: SessionStoreKind, settings: &SettingsStore) -> Arc<dyn SessionStore> {
    match kind {
        SessionStoreKind::File => Arc::new(FileSessionStore::new(settings.session_file())),
        SessionStoreKind::Memory => Arc::new(MemorySessionStore::new()),
        SessionStoreKind::Keyring => {
            let keyring = KeyringSessionStore::new();
            if keyring.is_available() {
                Arc::new(keyring)
            } else {
                tracing::warn!("keychain unavailable; storing the session in a file");
                Arc::new(FileSessionStore::new(settings.session_file()))
            }
        }
    }
}

pub struct AppState {
    pub settings: SettingsStore,
    pub session: SessionManager,
    pub files: FileService,
}

impl AppState {
    /// Loads settings from `config_dir` (or the platform default) and
    /// restores the stored session. `base_url` overrides the configured one.
    pub fn build(config_dir: Option<PathBuf>, base_url: Option<&str>) -> Result<Self, ClientError> {
        let dir = config_dir.or_else(default_config_dir).ok_or_else(|| {
            ClientError::Validation(
                "could not determine a configuration directory; pass --config-dir".to_string(),
            )
        })?;
        let settings = SettingsStore::open_in(&dir)?;

        let base_url = base_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| settings.base_url());
        let api = ApiClient::new(&base_url).map_err(|e| ClientError::from_api(e, "invalid base url"))?;
        tracing::debug!(base_url = %api.base_url(), config = %settings.path().display(), "client configured");

        let store = open_session_store(settings.session_store_kind(), &settings);
        let session = SessionManager::restore(Arc::new(api), store);
        let files = FileService::new(session.clone());

        Ok(Self {
            settings,
            session,
            files,
        })
    }

    pub fn refresh_interval(&self) -> Duration {
        refresh_interval(self.settings.refresh_interval_seconds())
    }
}
