use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status and an `{error}` body.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Outfit draft is empty")]
    EmptyDraft,

    #[error("Cannot determine data directory")]
    NoDataDir,

    #[error("Session cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session cache is unreadable: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
