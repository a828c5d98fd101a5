use thiserror::Error;

use crate::retry::RetryableError;

/// Error taxonomy for remote calls. Transport and 5xx-class failures are
/// transient; 4xx-class failures are contract violations and are never
/// retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response payload: {0}")]
    Decode(String),
}

impl RetryableError for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            ApiError::Decode(_) => false,
        }
    }
}
