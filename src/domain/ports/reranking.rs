//! Port trait for cross-scoring passages against a query.

use async_trait::async_trait;

use crate::domain::error::RerankError;

/// Relevance-scoring model (cross-encoder style).
///
/// `score` returns one relevance value per input passage, in input
/// order. The scoring contract, not any specific model's numerics, is
/// what the pipeline depends on: higher means more relevant, and
/// BGE-style models stay within [0, 1].
#[async_trait]
pub trait RelevanceModel: Send + Sync {
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>, RerankError>;
}
