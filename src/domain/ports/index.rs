//! Port trait for ranked passage search.

use async_trait::async_trait;

use crate::domain::error::IndexError;
use crate::domain::models::PassageHit;

/// Ranked search over the passage corpus.
///
/// Both the dense (vector) and lexical (BM25) indices implement this
/// trait; they are pre-built and read-only from the pipeline's point of
/// view. Results are ordered most-relevant first; scores may be absent.
#[async_trait]
pub trait PassageIndex: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<PassageHit>, IndexError>;
}
