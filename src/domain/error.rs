//! Domain error taxonomy.
//!
//! The interesting distinctions are behavioral: `IndexUnavailable` is
//! fatal for the request and never retried (ingestion must run first),
//! generation failures propagate in one-shot mode but become inline
//! stream events in streaming mode, and "no relevant context" is not an
//! error at all — it is the fallback response.

use thiserror::Error;

/// Errors produced by the generation model port.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation call timed out after {0}s")]
    Timeout(u64),

    #[error("generation API error: {0}")]
    Api(String),

    #[error("generation stream error: {0}")]
    Stream(String),

    #[error("malformed generation response: {0}")]
    Malformed(String),
}

/// Errors produced by the embedding port.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding API error: {0}")]
    Api(String),

    #[error("malformed embedding response: {0}")]
    Malformed(String),
}

/// Errors produced by the passage index ports.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The pre-built index is missing or unreadable. Fatal for the
    /// request; ingestion is an out-of-band step.
    #[error("passage index unavailable: {0} (run ingestion first)")]
    Unavailable(String),

    #[error("index search failed: {0}")]
    Backend(String),
}

/// Errors produced by the relevance-scoring (reranker) port.
#[derive(Debug, Error)]
pub enum RerankError {
    #[error("rerank API error: {0}")]
    Api(String),

    #[error("malformed rerank response: {0}")]
    Malformed(String),
}

/// Service-level errors surfaced to the orchestrator's callers.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Rerank(#[from] RerankError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

pub type AssistantResult<T> = Result<T, AssistantError>;

impl From<EmbeddingError> for IndexError {
    fn from(err: EmbeddingError) -> Self {
        IndexError::Backend(err.to_string())
    }
}
