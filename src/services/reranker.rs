//! Reranking and the grounding fallback policy.
//!
//! Fused candidates are cross-scored against the query, sorted by
//! relevance, and filtered by a threshold. The fallback rules, in
//! order: empty candidate set falls back; a best score below the
//! threshold marks the whole set irrelevant and falls back; otherwise
//! below-threshold entries are dropped; an empty survivor set falls
//! back. Only a non-fallback outcome produces a grounded answer.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::error::RerankError;
use crate::domain::models::{FusedResult, RerankedResult, RetrievalConfig};
use crate::domain::ports::RelevanceModel;

/// Outcome of reranking a fused candidate set.
#[derive(Debug)]
pub enum RerankOutcome {
    /// Passages relevant enough to ground an answer, sorted descending,
    /// at most `rerank_top_n`.
    Grounded(Vec<RerankedResult>),
    /// Nothing relevant enough; the caller must emit the fallback
    /// response instead of generating.
    Fallback,
}

impl RerankOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}

/// Relevance reranker with the fallback policy baked in.
pub struct Reranker {
    model: Arc<dyn RelevanceModel>,
    config: RetrievalConfig,
}

impl Reranker {
    pub fn new(model: Arc<dyn RelevanceModel>, config: RetrievalConfig) -> Self {
        Self { model, config }
    }

    /// Cross-score fused candidates and apply the fallback rules.
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub async fn rerank_and_filter(
        &self,
        query: &str,
        candidates: Vec<FusedResult>,
    ) -> Result<RerankOutcome, RerankError> {
        if candidates.is_empty() {
            debug!("no fused candidates, falling back");
            return Ok(RerankOutcome::Fallback);
        }

        let passages: Vec<String> = candidates.iter().map(|c| c.hit.text.clone()).collect();
        let scores = self.model.score(query, &passages).await?;
        if scores.len() != candidates.len() {
            return Err(RerankError::Malformed(format!(
                "expected {} scores, got {}",
                candidates.len(),
                scores.len()
            )));
        }

        let mut reranked: Vec<RerankedResult> = candidates
            .into_iter()
            .zip(scores)
            .map(|(candidate, relevance)| RerankedResult { hit: candidate.hit, relevance })
            .collect();
        reranked.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let threshold = self.config.relevance_threshold;
        match reranked.first() {
            Some(best) if best.relevance >= threshold => {}
            _ => {
                debug!(threshold, "best relevance below threshold, falling back");
                return Ok(RerankOutcome::Fallback);
            }
        }

        reranked.retain(|r| r.relevance >= threshold);
        reranked.truncate(self.config.rerank_top_n);

        if reranked.is_empty() {
            return Ok(RerankOutcome::Fallback);
        }
        debug!(grounded = reranked.len(), "grounded passages after filtering");
        Ok(RerankOutcome::Grounded(reranked))
    }
}
