//! Report store errors.

use thiserror::Error;

/// Errors raised by the remote report API and the local fallback store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No bearer token is available. Raised before any request is sent.
    #[error("Token de autenticação não encontrado")]
    AuthMissing,

    #[error("Remote report API unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Remote report API returned {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Local store error: {0}")]
    Local(String),
}

impl StoreError {
    /// Whether this error trips the session-scoped fallback to local storage.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            StoreError::RemoteUnavailable(_) | StoreError::RemoteStatus { .. }
        )
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::RemoteUnavailable(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Local(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Local(err.to_string())
    }
}
