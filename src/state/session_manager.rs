//! Client-side session state machine.
//!
//! `Unauthenticated` is `None`, `Authenticated` is `Some(Session)`. Every
//! transition updates the in-memory session and the [`SessionStore`] under
//! the same lock, so the two never disagree about which pair is current.
//!
//! Requests are never held under the lock. Overlapping operations race;
//! the rules for a late completion are:
//! - a failed validate/refresh only tears down the session whose token it
//!   checked, never a newer one;
//! - a successful refresh only replaces the token it refreshed, so it cannot
//!   resurrect a logged-out session or overwrite a fresh login;
//! - logout always wins locally.

use super::session_store::SessionStore;
use crate::api::{
    ApiClient, ApiResponse, RequestBody, PATH_LOGIN, PATH_LOGOUT, PATH_REFRESH, PATH_REGISTER,
    PATH_VALIDATE,
};
use crate::error::ClientError;
use crate::types::{AuthResult, RefreshOutcome, RefreshResult, Session, SessionStatus, ValidationResult};
use crate::validation::ensure_strong_password;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct SessionManager {
    api: Arc<ApiClient>,
    store: Arc<dyn SessionStore>,
    session: Arc<Mutex<Option<Session>>>,
}

impl SessionManager {
    /// Starts `Unauthenticated`, ignoring anything already persisted.
    pub fn new(api: Arc<ApiClient>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            api,
            store,
            session: Arc::new(Mutex::new(None)),
        }
    }

    /// Starts from whatever the store holds: `Authenticated` (pending
    /// validation) when a complete pair is persisted, otherwise
    /// `Unauthenticated`.
    pub fn restore(api: Arc<ApiClient>, store: Arc<dyn SessionStore>) -> Self {
        let restored = match store.load() {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "could not read stored session; starting signed out");
                None
            }
        };
        if let Some(session) = &restored {
            debug!(email = %session.email, "restored stored session");
        }
        Self {
            api,
            store,
            session: Arc::new(Mutex::new(restored)),
        }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub async fn status(&self) -> SessionStatus {
        if self.session.lock().await.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Unauthenticated
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.status().await == SessionStatus::Authenticated
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }

    pub async fn current_user(&self) -> Option<String> {
        self.session.lock().await.as_ref().map(|s| s.email.clone())
    }

    async fn current_token(&self) -> Option<String> {
        self.session.lock().await.as_ref().map(|s| s.token.clone())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        self.authenticate(PATH_LOGIN, email, password, "Login failed")
            .await
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClientError::InvalidCredentialsFormat);
        }
        ensure_strong_password(password)?;
        self.authenticate(PATH_REGISTER, email, password, "Registration failed")
            .await
    }

    async fn authenticate(
        &self,
        path: &str,
        email: &str,
        password: &str,
        default_message: &str,
    ) -> Result<Session, ClientError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ClientError::InvalidCredentialsFormat);
        }

        let body = json!({ "email": email, "password": password });
        let res = self
            .api
            .send(Method::POST, path, None, Some(RequestBody::Json(body)))
            .await
            .map_err(|e| ClientError::from_auth_api(e, default_message))?;

        let auth: AuthResult = res
            .json()
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        if auth.token.trim().is_empty() || auth.email.trim().is_empty() {
            return Err(ClientError::InvalidResponse(
                "authentication response is missing token or email".to_string(),
            ));
        }

        let session = Session::from(auth);
        {
            let mut guard = self.session.lock().await;
            *guard = Some(session.clone());
            self.persist(&session);
        }
        info!(email = %session.email, "session established");
        Ok(session)
    }

    /// Checks the current token with the server. A negative or failed check
    /// ends the session; nothing is returned to the caller but `false`.
    pub async fn validate_current_session(&self) -> bool {
        let Some(token) = self.current_token().await else {
            return false;
        };

        let valid = match self
            .api
            .send(Method::POST, PATH_VALIDATE, Some(&token), None)
            .await
        {
            Ok(res) => res
                .json::<ValidationResult>()
                .map(|v| v.valid)
                .unwrap_or(false),
            Err(err) => {
                debug!(error = %err, "session validation request failed");
                false
            }
        };

        if valid {
            return true;
        }
        if self.teardown_if_current(&token).await {
            info!("stored session is no longer valid; signed out");
        }
        false
    }

    /// Ends the session locally before telling the server, so the outcome
    /// of the logout request never keeps the user signed in.
    pub async fn logout(&self) {
        let ended = {
            let mut guard = self.session.lock().await;
            let ended = guard.take();
            self.forget();
            ended
        };
        let Some(session) = ended else {
            return;
        };
        info!("signed out");

        if let Err(err) = self
            .api
            .send(Method::POST, PATH_LOGOUT, Some(&session.token), None)
            .await
        {
            debug!(error = %err, "logout request failed; local session already cleared");
        }
    }

    /// Exchanges the current token for a fresh one. Failure tears the
    /// session down (without a logout request) and reports `Expired`.
    pub async fn refresh(&self) -> Result<RefreshOutcome, ClientError> {
        let Some(token) = self.current_token().await else {
            return Err(ClientError::NotAuthenticated);
        };

        let refreshed = self
            .api
            .send(Method::POST, PATH_REFRESH, Some(&token), None)
            .await
            .and_then(|res| res.json::<RefreshResult>());

        let new_token = match refreshed {
            Ok(r) if !r.token.trim().is_empty() => r.token.trim().to_string(),
            Ok(_) => {
                warn!("refresh response carried an empty token");
                return Ok(self.expire(&token).await);
            }
            Err(err) => {
                debug!(error = %err, "token refresh failed");
                return Ok(self.expire(&token).await);
            }
        };

        let mut guard = self.session.lock().await;
        match guard.as_mut() {
            Some(session) if session.token == token => {
                session.token = new_token;
                self.persist(session);
                debug!(email = %session.email, "token refreshed");
                Ok(RefreshOutcome::Refreshed)
            }
            _ => {
                debug!("session changed while refresh was in flight; dropping new token");
                Ok(RefreshOutcome::Skipped)
            }
        }
    }

    async fn expire(&self, token: &str) -> RefreshOutcome {
        if self.teardown_if_current(token).await {
            info!("session expired; signed out");
            RefreshOutcome::Expired
        } else {
            RefreshOutcome::Skipped
        }
    }

    /// Sends `method path` with the current bearer token. Errors from the
    /// API are returned untouched as [`ClientError::Api`].
    pub async fn authorized_request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<ApiResponse, ClientError> {
        let Some(token) = self.current_token().await else {
            return Err(ClientError::NotAuthenticated);
        };
        Ok(self.api.send(method, path, Some(&token), body).await?)
    }

    async fn teardown_if_current(&self, token: &str) -> bool {
        let mut guard = self.session.lock().await;
        if guard.as_ref().is_some_and(|s| s.token == token) {
            *guard = None;
            self.forget();
            true
        } else {
            false
        }
    }

    fn persist(&self, session: &Session) {
        if let Err(err) = self.store.save(session) {
            warn!(error = %err, "failed to persist session");
        }
    }

    fn forget(&self) {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear stored session");
        }
    }
}
