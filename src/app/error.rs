use thiserror::Error;

use crate::config::ConfigError;

/// Failure of a single request against the news API.
///
/// Cloneable so a failed fetch can be stored in a cache entry and handed to
/// every consumer that attached to it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error requesting {path}: {message}")]
    Network { path: String, message: String },

    #[error("HTTP {status} from {path}{}", detail(.message))]
    Http {
        status: u16,
        path: String,
        message: Option<String>,
    },

    #[error("Invalid response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl FetchError {
    /// HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            FetchError::Network { path, .. }
            | FetchError::Http { path, .. }
            | FetchError::Decode { path, .. } => Some(path),
            FetchError::InvalidUrl(_) => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum HeadlinerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, HeadlinerError>;
