use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::error::{EmbeddingError, GenerationError};

/// Errors from the OpenAI-compatible LLM API.
#[derive(Error, Debug)]
pub enum LlmApiError {
    /// Invalid request parameters (HTTP 400)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid or missing API key (HTTP 401)
    #[error("invalid API key - authentication failed")]
    InvalidApiKey,

    /// Forbidden - permission denied (HTTP 403)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Model or endpoint not found (HTTP 404)
    #[error("resource not found")]
    NotFound,

    /// Rate limit exceeded (HTTP 429)
    #[error("rate limit exceeded - too many requests")]
    RateLimitExceeded,

    /// Server error (HTTP 5xx)
    #[error("server error ({0}): {1}")]
    ServerError(StatusCode, String),

    /// Network or connection error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Request timeout
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Unknown or unexpected status
    #[error("unexpected error ({0}): {1}")]
    Unknown(StatusCode, String),
}

impl LlmApiError {
    /// Map a non-success HTTP status to a typed error.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::InvalidRequest(body),
            StatusCode::UNAUTHORIZED => Self::InvalidApiKey,
            StatusCode::FORBIDDEN => Self::Forbidden(body),
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimitExceeded,
            s if s.is_server_error() => Self::ServerError(s, body),
            s => Self::Unknown(s, body),
        }
    }
}

impl From<LlmApiError> for GenerationError {
    fn from(err: LlmApiError) -> Self {
        match err {
            LlmApiError::Timeout(secs) => GenerationError::Timeout(secs),
            LlmApiError::Malformed(msg) => GenerationError::Malformed(msg),
            other => GenerationError::Api(other.to_string()),
        }
    }
}

impl From<LlmApiError> for EmbeddingError {
    fn from(err: LlmApiError) -> Self {
        match err {
            LlmApiError::Malformed(msg) => EmbeddingError::Malformed(msg),
            other => EmbeddingError::Api(other.to_string()),
        }
    }
}
