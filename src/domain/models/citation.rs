//! Citation-bearing answer models.

use serde::{Deserialize, Serialize};

use super::passage::RerankedResult;

/// A truncated source citation attached to a grounded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Passage text, truncated to the configured limit with a trailing
    /// ellipsis marker when longer.
    pub text: String,
    /// Relevance score rounded to 3 decimal places (0.0 when unscored).
    pub score: f32,
    /// File the passage came from.
    pub source_file: String,
    /// Stable passage identifier.
    pub passage_id: String,
}

impl SourceInfo {
    /// Build a citation from a reranked passage, applying the truncation
    /// and rounding rules at this single boundary.
    pub fn from_reranked(result: &RerankedResult, text_limit: usize) -> Self {
        Self {
            text: truncate_with_ellipsis(&result.hit.text, text_limit),
            score: round3(result.relevance),
            source_file: result.hit.source_file.clone(),
            passage_id: result.hit.id.clone(),
        }
    }
}

/// A grounded answer plus its bounded citation list.
///
/// `is_fallback == true` implies `sources` is empty and `answer` is the
/// fixed fallback text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationResponse {
    pub answer: String,
    pub sources: Vec<SourceInfo>,
    #[serde(default)]
    pub is_fallback: bool,
}

impl CitationResponse {
    pub fn fallback(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
            is_fallback: true,
        }
    }
}

/// Truncate on a character boundary and append `...` when over the limit.
pub fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit).collect();
    truncated.push_str("...");
    truncated
}

/// Round a score to 3 decimal places for citation display.
pub fn round3(score: f32) -> f32 {
    (score * 1000.0).round() / 1000.0
}
