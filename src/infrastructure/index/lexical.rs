//! Lexical passage index: in-memory BM25 over the same corpus file.
//!
//! Standard Okapi BM25 with `k1 = 1.2`, `b = 0.75`. Tokenization is
//! Unicode-aware lowercasing split on non-alphanumeric runs, which
//! keeps Vietnamese diacritics intact. Documents are indexed once at
//! load; search is a term-at-a-time scan over the postings.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use super::corpus::{load_corpus, PassageRecord};
use crate::domain::error::IndexError;
use crate::domain::models::PassageHit;
use crate::domain::ports::PassageIndex;

const BM25_K1: f32 = 1.2;
const BM25_B: f32 = 0.75;

pub struct LexicalIndex {
    records: Vec<PassageRecord>,
    /// term -> (doc ordinal, term frequency) postings.
    postings: HashMap<String, Vec<(usize, u32)>>,
    doc_lengths: Vec<u32>,
    avg_doc_length: f32,
}

impl LexicalIndex {
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        Ok(Self::from_records(load_corpus(path)?))
    }

    pub fn from_records(records: Vec<PassageRecord>) -> Self {
        let mut postings: HashMap<String, Vec<(usize, u32)>> = HashMap::new();
        let mut doc_lengths = Vec::with_capacity(records.len());

        for (ordinal, record) in records.iter().enumerate() {
            let mut counts: HashMap<String, u32> = HashMap::new();
            let mut length = 0u32;
            for token in tokenize(&record.text) {
                *counts.entry(token).or_insert(0) += 1;
                length += 1;
            }
            doc_lengths.push(length);
            for (term, count) in counts {
                postings.entry(term).or_default().push((ordinal, count));
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let avg_doc_length = if doc_lengths.is_empty() {
            0.0
        } else {
            doc_lengths.iter().sum::<u32>() as f32 / doc_lengths.len() as f32
        };

        Self { records, postings, doc_lengths, avg_doc_length }
    }

    #[allow(clippy::cast_precision_loss)]
    fn score_query(&self, query: &str) -> Vec<(usize, f32)> {
        let total_docs = self.records.len() as f32;
        let mut scores: HashMap<usize, f32> = HashMap::new();

        for term in tokenize(query) {
            let Some(postings) = self.postings.get(&term) else {
                continue;
            };
            let doc_freq = postings.len() as f32;
            let idf = ((total_docs - doc_freq + 0.5) / (doc_freq + 0.5) + 1.0).ln();

            for &(ordinal, term_freq) in postings {
                let tf = term_freq as f32;
                let doc_len = self.doc_lengths[ordinal] as f32;
                let norm = BM25_K1 * (1.0 - BM25_B + BM25_B * doc_len / self.avg_doc_length);
                let contribution = idf * tf * (BM25_K1 + 1.0) / (tf + norm);
                *scores.entry(ordinal).or_insert(0.0) += contribution;
            }
        }

        let mut scored: Vec<(usize, f32)> = scores.into_iter().collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored
    }
}

#[async_trait]
impl PassageIndex for LexicalIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<PassageHit>, IndexError> {
        Ok(self
            .score_query(query)
            .into_iter()
            .take(k)
            .map(|(ordinal, score)| {
                let r = &self.records[ordinal];
                PassageHit {
                    id: r.id.clone(),
                    text: r.text.clone(),
                    source_file: r.source_file.clone(),
                    score: Some(score),
                }
            })
            .collect())
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>()
        .into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::index::corpus::test_support::record;

    fn index() -> LexicalIndex {
        LexicalIndex::from_records(vec![
            record("p1", "trầm cảm là một rối loạn khí sắc phổ biến", &[]),
            record("p2", "rối loạn lo âu lan tỏa gây lo lắng kéo dài", &[]),
            record("p3", "giấc ngủ và vệ sinh giấc ngủ", &[]),
        ])
    }

    #[test]
    fn test_tokenize_keeps_diacritics() {
        let tokens: Vec<String> = tokenize("Trầm cảm, lo âu!").collect();
        assert_eq!(tokens, vec!["trầm", "cảm", "lo", "âu"]);
    }

    #[tokio::test]
    async fn test_matching_doc_ranks_first() {
        let hits = index().search("trầm cảm khí sắc", 3).await.unwrap();
        assert_eq!(hits[0].id, "p1");
        assert!(hits[0].score.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_no_match_returns_empty() {
        let hits = index().search("xyzzy", 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_k_bounds_results() {
        let hits = index().search("rối loạn giấc ngủ", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_rare_term_outweighs_common_term() {
        // "rối loạn" appears in two docs, "khí sắc" only in p1.
        let hits = index().search("khí sắc", 3).await.unwrap();
        assert_eq!(hits[0].id, "p1");
    }
}
