//! Port trait for text embeddings (dense retrieval queries).

use async_trait::async_trait;

use crate::domain::error::EmbeddingError;

/// Embeds query text into the same vector space as the pre-built corpus
/// embeddings.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}
