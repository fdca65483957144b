//! Retrieved passage models for the hybrid retrieval pipeline.

use serde::{Deserialize, Serialize};

/// A single retrieved unit of corpus text.
///
/// The raw score is whatever the producing index assigned (cosine
/// similarity for the dense index, BM25 for the lexical index) and may be
/// absent. It is defaulted to 0.0 only at the boundary where scores are
/// extracted for display, never scattered across call sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageHit {
    /// Stable passage identifier from the ingestion step.
    pub id: String,
    /// Passage text.
    pub text: String,
    /// File the passage was ingested from.
    pub source_file: String,
    /// Index-native score, if the index produced one.
    pub score: Option<f32>,
}

impl PassageHit {
    /// The passage score with the defined boundary default of 0.0.
    pub fn score_or_default(&self) -> f32 {
        self.score.unwrap_or(0.0)
    }
}

/// A passage after Reciprocal Rank Fusion of the dense and lexical lists.
///
/// Fused lists are sorted descending by `fused_score`; ties break by
/// dense rank, then lexical rank, so fusion output is deterministic for
/// identical index results.
#[derive(Debug, Clone)]
pub struct FusedResult {
    pub hit: PassageHit,
    /// Sum of `1 / (rank + k)` over each list the passage appeared in.
    pub fused_score: f64,
    /// 0-based rank in the dense result list, if present there.
    pub dense_rank: Option<usize>,
    /// 0-based rank in the lexical result list, if present there.
    pub lexical_rank: Option<usize>,
}

/// A fused passage after cross-scoring against the query.
#[derive(Debug, Clone)]
pub struct RerankedResult {
    pub hit: PassageHit,
    /// Reranker-assigned relevance, model-native range (BGE-style [0, 1]).
    pub relevance: f32,
}
