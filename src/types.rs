use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Unauthenticated,
    Authenticated,
}

/// The authenticated identity held between login and logout/expiry.
///
/// Token and identity only ever exist together; an absent session is
/// modelled as `Option<Session>::None`, never as a half-filled struct.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub email: String,
}

impl Session {
    pub fn new(token: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            email: email.into(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"REDACTED")
            .field("email", &self.email)
            .finish()
    }
}

/// Body of a successful login/register call.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResult {
    pub token: String,
    pub email: String,
}

impl From<AuthResult> for Session {
    fn from(value: AuthResult) -> Self {
        Session::new(value.token, value.email)
    }
}

/// Body of a successful refresh call. The server echoes the email, but the
/// session identity is never taken from it.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResult {
    pub token: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ValidationResult {
    #[serde(default)]
    pub valid: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Token replaced in place.
    Refreshed,
    /// Refresh failed and the session was torn down.
    Expired,
    /// No session at fire time.
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub tiny_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub compressed: Option<bool>,
}

impl FileRecord {
    pub fn share_token(&self) -> Option<&str> {
        self.tiny_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn is_shared(&self) -> bool {
        self.share_token().is_some()
    }
}
