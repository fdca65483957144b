//! Hybrid retrieval: dense and lexical search fused by Reciprocal Rank
//! Fusion.
//!
//! Both index searches run concurrently. RRF works on ranks only — the
//! incomparable cosine and BM25 score scales never mix. A passage's
//! fused score is `Σ 1/(rank + k)` over each list it appears in, with
//! 0-based ranks and the standard smoothing constant `k = 60` by
//! default.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::error::IndexError;
use crate::domain::models::{FusedResult, PassageHit, RetrievalConfig};
use crate::domain::ports::PassageIndex;

/// Dense + lexical retrieval with rank fusion.
pub struct HybridRetriever {
    dense: Arc<dyn PassageIndex>,
    lexical: Arc<dyn PassageIndex>,
    config: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(
        dense: Arc<dyn PassageIndex>,
        lexical: Arc<dyn PassageIndex>,
        config: RetrievalConfig,
    ) -> Self {
        Self { dense, lexical, config }
    }

    /// Retrieve the fused top passages for a query.
    ///
    /// One index failing mid-flight fails the retrieval; partial fusion
    /// over a single list would silently change ranking semantics.
    #[instrument(skip(self), fields(query_chars = query.chars().count()))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<FusedResult>, IndexError> {
        let (dense_hits, lexical_hits) = tokio::try_join!(
            self.dense.search(query, self.config.vector_top_k),
            self.lexical.search(query, self.config.lexical_top_k),
        )?;

        debug!(
            dense = dense_hits.len(),
            lexical = lexical_hits.len(),
            "index results before fusion"
        );

        let fused = fuse(
            &dense_hits,
            &lexical_hits,
            self.config.rrf_k,
            self.config.fusion_top_k,
        );
        Ok(fused)
    }
}

/// Reciprocal Rank Fusion of two ranked lists.
///
/// Deduplicates by passage id; the first list to contribute a passage
/// supplies its hit payload. Output is sorted descending by fused score,
/// ties broken by dense rank then lexical rank (absent ranks sort last),
/// and truncated to `top_k`.
pub fn fuse(
    dense: &[PassageHit],
    lexical: &[PassageHit],
    rrf_k: u32,
    top_k: usize,
) -> Vec<FusedResult> {
    let k = f64::from(rrf_k);
    let mut by_id: HashMap<&str, FusedResult> = HashMap::new();

    for (rank, hit) in dense.iter().enumerate() {
        let contribution = 1.0 / (rank as f64 + k);
        by_id
            .entry(hit.id.as_str())
            .and_modify(|entry| {
                entry.fused_score += contribution;
                entry.dense_rank = Some(rank);
            })
            .or_insert_with(|| FusedResult {
                hit: hit.clone(),
                fused_score: contribution,
                dense_rank: Some(rank),
                lexical_rank: None,
            });
    }

    for (rank, hit) in lexical.iter().enumerate() {
        let contribution = 1.0 / (rank as f64 + k);
        by_id
            .entry(hit.id.as_str())
            .and_modify(|entry| {
                entry.fused_score += contribution;
                entry.lexical_rank = Some(rank);
            })
            .or_insert_with(|| FusedResult {
                hit: hit.clone(),
                fused_score: contribution,
                dense_rank: None,
                lexical_rank: Some(rank),
            });
    }

    let mut fused: Vec<FusedResult> = by_id.into_values().collect();
    fused.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| rank_key(a.dense_rank).cmp(&rank_key(b.dense_rank)))
            .then_with(|| rank_key(a.lexical_rank).cmp(&rank_key(b.lexical_rank)))
    });
    fused.truncate(top_k);
    fused
}

fn rank_key(rank: Option<usize>) -> usize {
    rank.unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn hit(id: &str) -> PassageHit {
        PassageHit {
            id: id.to_string(),
            text: format!("passage {id}"),
            source_file: "dsm5.docx".to_string(),
            score: Some(0.5),
        }
    }

    fn hits(ids: &[&str]) -> Vec<PassageHit> {
        ids.iter().map(|id| hit(id)).collect()
    }

    #[test]
    fn test_fusion_ordering() {
        // Dense [A, B, C], lexical [C, A, D]:
        // A: 1/60 + 1/61, C: 1/62 + 1/60, B: 1/61, D: 1/61.
        let fused = fuse(&hits(&["A", "B", "C"]), &hits(&["C", "A", "D"]), 60, 10);
        let order: Vec<&str> = fused.iter().map(|f| f.hit.id.as_str()).collect();
        assert_eq!(order, vec!["A", "C", "B", "D"]);
    }

    #[test]
    fn test_fusion_tie_breaks_by_dense_rank() {
        // B and D tie on fused score (both only lexical/dense rank 1);
        // B appears in dense so it wins.
        let fused = fuse(&hits(&["A", "B"]), &hits(&["A", "D"]), 60, 10);
        let order: Vec<&str> = fused.iter().map(|f| f.hit.id.as_str()).collect();
        assert_eq!(order[0], "A");
        assert_eq!(order[1], "B");
        assert_eq!(order[2], "D");
    }

    #[test]
    fn test_fusion_records_both_ranks() {
        let fused = fuse(&hits(&["A", "B"]), &hits(&["B"]), 60, 10);
        let b = fused.iter().find(|f| f.hit.id == "B").unwrap();
        assert_eq!(b.dense_rank, Some(1));
        assert_eq!(b.lexical_rank, Some(0));
        let a = fused.iter().find(|f| f.hit.id == "A").unwrap();
        assert_eq!(a.lexical_rank, None);
    }

    #[test]
    fn test_fusion_truncates_to_top_k() {
        let fused = fuse(&hits(&["A", "B", "C", "D"]), &hits(&["E", "F"]), 60, 3);
        assert_eq!(fused.len(), 3);
    }

    #[test]
    fn test_fusion_of_empty_lists() {
        assert!(fuse(&[], &[], 60, 10).is_empty());
        let fused = fuse(&hits(&["A"]), &[], 60, 10);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].dense_rank, Some(0));
    }

    struct StaticIndex {
        hits: Vec<PassageHit>,
    }

    #[async_trait]
    impl PassageIndex for StaticIndex {
        async fn search(&self, _query: &str, k: usize) -> Result<Vec<PassageHit>, IndexError> {
            Ok(self.hits.iter().take(k).cloned().collect())
        }
    }

    struct FailingIndex;

    #[async_trait]
    impl PassageIndex for FailingIndex {
        async fn search(&self, _query: &str, _k: usize) -> Result<Vec<PassageHit>, IndexError> {
            Err(IndexError::Backend("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_retrieve_fuses_both_indexes() {
        let retriever = HybridRetriever::new(
            Arc::new(StaticIndex { hits: hits(&["A", "B", "C"]) }),
            Arc::new(StaticIndex { hits: hits(&["C", "A", "D"]) }),
            RetrievalConfig::default(),
        );
        let fused = retriever.retrieve("trầm cảm là gì").await.unwrap();
        let order: Vec<&str> = fused.iter().map(|f| f.hit.id.as_str()).collect();
        assert_eq!(order, vec!["A", "C", "B", "D"]);
    }

    #[tokio::test]
    async fn test_retrieve_fails_when_one_index_fails() {
        let retriever = HybridRetriever::new(
            Arc::new(StaticIndex { hits: hits(&["A"]) }),
            Arc::new(FailingIndex),
            RetrievalConfig::default(),
        );
        assert!(retriever.retrieve("query").await.is_err());
    }
}
