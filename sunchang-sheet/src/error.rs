use thiserror::Error;

/// Why a collection fetch failed
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The endpoint answered with an HTML page: the script's sign-in redirect
    /// replaces the JSON body when its access is not set to "Anyone".
    #[error("permission denied: endpoint returned an HTML sign-in page (deploy the script with access set to \"Anyone\")")]
    PermissionDenied,

    #[error("HTTP error: {status}")]
    Transport { status: reqwest::StatusCode },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("response body is not JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Coarse failure class shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Config,
    Permission,
    Transport,
    Format,
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::InvalidUrl { .. } => FetchErrorKind::Config,
            FetchError::PermissionDenied => FetchErrorKind::Permission,
            FetchError::Transport { .. } | FetchError::Network(_) => FetchErrorKind::Transport,
            FetchError::Decode(_) => FetchErrorKind::Format,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
