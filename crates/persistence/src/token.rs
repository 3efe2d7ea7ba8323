//! Bearer token lookup for the remote report API.

use std::path::PathBuf;

use crate::error::StoreError;

/// Where the bearer token comes from.
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// A fixed token from configuration; `None` means no token.
    Static(Option<String>),
    /// A file holding the token, re-read on every call.
    File(PathBuf),
}

impl TokenSource {
    /// Returns the current token, or [`StoreError::AuthMissing`].
    pub async fn token(&self) -> Result<String, StoreError> {
        let raw = match self {
            TokenSource::Static(token) => token.clone(),
            TokenSource::File(path) => match tokio::fs::read_to_string(path).await {
                Ok(contents) => Some(contents),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Token file not readable");
                    None
                }
            },
        };

        raw.map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(StoreError::AuthMissing)
    }
}
