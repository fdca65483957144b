//! Dense passage index: cosine similarity over pre-computed embeddings.
//!
//! The corpus is small enough (one manual) that brute-force top-k over
//! all passages is well under a millisecond; no ANN structure is
//! warranted. Query embeddings come from the embedding port at search
//! time.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::corpus::{load_corpus, PassageRecord};
use crate::domain::error::IndexError;
use crate::domain::models::PassageHit;
use crate::domain::ports::{EmbeddingClient, PassageIndex};

pub struct VectorIndex {
    records: Vec<PassageRecord>,
    embedder: Arc<dyn EmbeddingClient>,
}

impl VectorIndex {
    /// Load the pre-built corpus; missing file fails here, not per
    /// request.
    pub fn load(path: &Path, embedder: Arc<dyn EmbeddingClient>) -> Result<Self, IndexError> {
        let records = load_corpus(path)?;
        Ok(Self { records, embedder })
    }

    pub fn from_records(records: Vec<PassageRecord>, embedder: Arc<dyn EmbeddingClient>) -> Self {
        Self { records, embedder }
    }
}

#[async_trait]
impl PassageIndex for VectorIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<PassageHit>, IndexError> {
        let query_embedding = self.embedder.embed(query).await.map_err(IndexError::from)?;

        let mut scored: Vec<(f32, &PassageRecord)> = self
            .records
            .iter()
            .map(|r| (cosine_similarity(&query_embedding, &r.embedding), r))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, r)| PassageHit {
                id: r.id.clone(),
                text: r.text.clone(),
                source_file: r.source_file.clone(),
                score: Some(score),
            })
            .collect())
    }
}

/// Cosine similarity; zero-norm or length-mismatched vectors score 0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
