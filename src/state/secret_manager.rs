use super::session_store::{classify_pair, StoreError, StoredPair, SessionStore, KEY_AUTH_TOKEN, KEY_CURRENT_USER};
use crate::types::Session;

pub const KEYRING_SERVICE: &str = "com.minicloud.client";

/// Session pair kept in the OS keychain / secret service as two entries.
#[derive(Clone)]
pub struct KeyringSessionStore {
    service: String,
}

impl KeyringSessionStore {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, user: &str) -> Result<keyring::Entry, StoreError> {
        keyring::Entry::new(&self.service, user).map_err(map_keyring_error)
    }

    pub fn is_available(&self) -> bool {
        let Ok(entry) = self.entry(KEY_AUTH_TOKEN) else {
            return false;
        };

        match entry.get_password() {
            Ok(_) => true,
            Err(keyring::Error::NoEntry) => true,
            Err(keyring::Error::BadEncoding(_)) => true,
            Err(keyring::Error::Ambiguous(_)) => true,
            Err(keyring::Error::NoStorageAccess(_)) => false,
            Err(keyring::Error::PlatformFailure(_)) => false,
            Err(_) => false,
        }
    }

    fn read(&self, user: &str) -> Result<Option<String>, StoreError> {
        match self.entry(user)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(keyring::Error::BadEncoding(_)) => Ok(None),
            Err(e) => Err(map_keyring_error(e)),
        }
    }

    fn delete(&self, user: &str) -> Result<(), StoreError> {
        match self.entry(user)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(map_keyring_error(e)),
        }
    }
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn map_keyring_error(err: keyring::Error) -> StoreError {
    StoreError::Keyring(err.to_string())
}

impl SessionStore for KeyringSessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        let token = self.read(KEY_AUTH_TOKEN)?;
        let user = self.read(KEY_CURRENT_USER)?;
        match classify_pair(token, user) {
            StoredPair::Complete(session) => Ok(Some(session)),
            StoredPair::Empty => Ok(None),
            StoredPair::Partial => {
                tracing::warn!(service = %self.service, "discarding incomplete keychain session");
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.entry(KEY_AUTH_TOKEN)?
            .set_password(&session.token)
            .map_err(map_keyring_error)?;

        let written = self
            .entry(KEY_CURRENT_USER)
            .and_then(|e| e.set_password(&session.email).map_err(map_keyring_error));
        if let Err(err) = written {
            // Never leave a token without its identity.
            let _ = self.delete(KEY_AUTH_TOKEN);
            return Err(err);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let token = self.delete(KEY_AUTH_TOKEN);
        let user = self.delete(KEY_CURRENT_USER);
        token.and(user)
    }
}
