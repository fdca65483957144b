//! Answer synthesis with citations.
//!
//! Grounded passages become a bracket-indexed context block inside a
//! fixed Vietnamese answer-from-context-only prompt. The fallback path
//! is fixed text with no sources and no model call. Truncation,
//! rounding, and the source cap all happen here, at the single boundary
//! where citations leave the pipeline.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::error::GenerationError;
use crate::domain::models::{CitationResponse, RerankedResult, RetrievalConfig, SourceInfo};
use crate::domain::ports::{GenerationClient, TokenStream};

/// Answer-from-context-only template. The model is told to admit when
/// the context does not contain the answer.
const RESPONSE_TEMPLATE_VI: &str = "Dựa trên thông tin ngữ cảnh được cung cấp bên dưới, hãy trả lời câu hỏi.\n\
Nếu câu trả lời không có trong ngữ cảnh, hãy nói \"Tôi không tìm thấy thông tin này trong tài liệu DSM-5.\"\n\
\n\
Ngữ cảnh:\n\
{context_str}\n\
\n\
Câu hỏi: {query_str}\n\
\n\
Hãy trả lời bằng tiếng Việt, ngắn gọn và chính xác.";

/// Fixed reply when retrieval found nothing relevant enough.
pub const FALLBACK_RESPONSE_VI: &str = "Tôi không tìm thấy thông tin liên quan trong tài liệu DSM-5. \
Bạn có thể mô tả chi tiết hơn hoặc hỏi về một chủ đề cụ thể về sức khỏe tâm thần không?";

/// Builds grounded answers and their citation lists.
pub struct CitationSynthesizer {
    generation: Arc<dyn GenerationClient>,
    config: RetrievalConfig,
}

impl CitationSynthesizer {
    pub fn new(generation: Arc<dyn GenerationClient>, config: RetrievalConfig) -> Self {
        Self { generation, config }
    }

    /// One-shot grounded answer over the reranked passages.
    #[instrument(skip(self, reranked), fields(passages = reranked.len()))]
    pub async fn synthesize(
        &self,
        query: &str,
        reranked: &[RerankedResult],
    ) -> Result<CitationResponse, GenerationError> {
        let prompt = build_prompt(query, reranked);
        let answer = self.generation.complete(&prompt).await?;
        let sources = self.extract_sources(reranked);
        debug!(sources = sources.len(), "synthesized grounded answer");
        Ok(CitationResponse { answer, sources, is_fallback: false })
    }

    /// Streaming variant: the token stream for the same prompt, plus the
    /// citations the caller emits after the last token.
    pub async fn synthesize_stream(
        &self,
        query: &str,
        reranked: &[RerankedResult],
    ) -> Result<(TokenStream, Vec<SourceInfo>), GenerationError> {
        let prompt = build_prompt(query, reranked);
        let stream = self
            .generation
            .stream_chat(&[crate::domain::ports::ChatMessage::user(prompt)])
            .await?;
        Ok((stream, self.extract_sources(reranked)))
    }

    /// The fixed no-relevant-context response. No model call.
    pub fn fallback_response(&self) -> CitationResponse {
        CitationResponse::fallback(FALLBACK_RESPONSE_VI)
    }

    /// Citations for the grounding set: truncated, rounded, capped at
    /// `max_sources` regardless of how many passages grounded the answer.
    fn extract_sources(&self, reranked: &[RerankedResult]) -> Vec<SourceInfo> {
        reranked
            .iter()
            .take(self.config.max_sources)
            .map(|r| SourceInfo::from_reranked(r, self.config.source_text_limit))
            .collect()
    }
}

/// Context block with 1-based bracket indices, substituted into the
/// fixed template.
fn build_prompt(query: &str, reranked: &[RerankedResult]) -> String {
    let context: Vec<String> = reranked
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[{}] {}", i + 1, r.hit.text))
        .collect();
    RESPONSE_TEMPLATE_VI
        .replace("{context_str}", &context.join("\n\n"))
        .replace("{query_str}", query)
}
