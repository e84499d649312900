use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single request against the scenario server.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Setup(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status of a non-2xx response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// URL of the failed request, if one was made.
    pub fn url(&self) -> Option<&str> {
        match self {
            ApiError::Setup(_) => None,
            ApiError::Transport { url, .. }
            | ApiError::Status { url, .. }
            | ApiError::Decode { url, .. } => Some(url),
        }
    }
}
