use crate::api::ApiError;
use crate::state::StoreError;
use crate::validation::PasswordRule;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Client-side field check; never reaches the network.
    #[error("{0}")]
    Validation(String),
    #[error("email and password must both be non-empty")]
    InvalidCredentialsFormat,
    #[error("Password must be at least 8 characters with uppercase, lowercase, and number")]
    WeakPassword(Vec<PasswordRule>),
    #[error("{0}")]
    Authentication(String),
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("network error: {0}")]
    Network(String),
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("session store error: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Raw API failure from an authorized request, not yet given a
    /// per-operation default message.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ClientError {
    /// Maps an API failure of a file/share operation, falling back to
    /// `default_message` when the server sent no usable message.
    pub fn from_api(err: ApiError, default_message: &str) -> Self {
        match err {
            ApiError::Network(msg) => Self::Network(msg),
            ApiError::Status { status, message } => Self::Server {
                status,
                message: message.unwrap_or_else(|| default_message.to_string()),
            },
            ApiError::Json(msg) => Self::InvalidResponse(msg),
            ApiError::InvalidBaseUrl(msg) => Self::Validation(msg),
        }
    }

    /// Same as [`ClientError::from_api`] for credential endpoints, where a
    /// server rejection is an authentication failure.
    pub fn from_auth_api(err: ApiError, default_message: &str) -> Self {
        match err {
            ApiError::Status { message, .. } => {
                Self::Authentication(message.unwrap_or_else(|| default_message.to_string()))
            }
            other => Self::from_api(other, default_message),
        }
    }

    /// Resolves a raw [`ClientError::Api`] with the operation's default
    /// message; every other variant passes through.
    pub fn with_default(self, default_message: &str) -> Self {
        match self {
            Self::Api(err) => Self::from_api(err, default_message),
            other => other,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Api(ApiError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_wins_over_default() {
        let err = ClientError::from_api(
            ApiError::Status {
                status: 400,
                message: Some("Delete failed: Denied".to_string()),
            },
            "Delete failed",
        );
        assert_eq!(err.to_string(), "Delete failed: Denied");
        assert_eq!(err.status_code(), Some(400));
    }

    #[test]
    fn default_message_used_when_server_is_silent() {
        let err = ClientError::from_auth_api(
            ApiError::Status {
                status: 401,
                message: None,
            },
            "Login failed",
        );
        assert!(matches!(err, ClientError::Authentication(ref m) if m == "Login failed"));
    }

    #[test]
    fn with_default_only_touches_raw_api_errors() {
        let raw = ClientError::Api(ApiError::Status {
            status: 500,
            message: None,
        });
        assert_eq!(raw.with_default("Upload failed").to_string(), "Upload failed");

        let untouched = ClientError::NotAuthenticated.with_default("Upload failed");
        assert!(matches!(untouched, ClientError::NotAuthenticated));
    }

    #[test]
    fn network_failure_is_not_an_auth_failure() {
        let err = ClientError::from_auth_api(ApiError::Network("refused".into()), "Login failed");
        assert!(matches!(err, ClientError::Network(_)));
    }
}
