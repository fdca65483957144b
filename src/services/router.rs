//! Query routing: grounded retrieval vs. plain conversation.
//!
//! A deterministic rule classifier decides whether a message needs the
//! DSM-5 retrieval pipeline or a plain memory-backed chat completion.
//! The decision is a typed enum owned by the orchestrator, not a
//! model-side tool choice, so tests can pin it and logs can explain it.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// How the orchestrator should answer a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Run retrieve → rerank → synthesize and answer from the corpus.
    Grounded,
    /// Answer from session history alone.
    Conversational,
}

/// Clinical vocabulary that signals a knowledge question: diagnostic
/// criteria, symptoms, disorder names, manual references.
const CLINICAL_KEYWORDS: &[&str] = &[
    "dsm",
    "dsm-5",
    "tiêu chuẩn chẩn đoán",
    "chẩn đoán",
    "triệu chứng",
    "rối loạn",
    "phân loại bệnh",
    "trầm cảm",
    "lo âu",
    "hoảng sợ",
    "tâm thần phân liệt",
    "lưỡng cực",
    "ám ảnh cưỡng chế",
    "ptsd",
    "sang chấn",
    "tự kỷ",
    "tăng động",
    "adhd",
    "mất ngủ",
    "rối loạn ăn uống",
    "chán ăn tâm thần",
    "ăn ói",
    "nghiện",
    "sa sút trí tuệ",
    "hoang tưởng",
    "ảo giác",
    "khí sắc",
    "hành vi",
    "liệu pháp",
    "điều trị",
    "thuốc",
    "tâm lý trị liệu",
];

/// Interrogatives that mark a definitional or factual question.
static QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(là gì|là sao|như thế nào|thế nào|tại sao|vì sao|bao nhiêu|khi nào|có phải|được định nghĩa|khác nhau|phân biệt|\?)",
    )
    .expect("question pattern is a valid regex")
});

/// Rule-based router over the user message.
#[derive(Debug, Default)]
pub struct QueryRouter {
    extra_keywords: Vec<String>,
}

impl QueryRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with deployment-specific keywords added to the built-in
    /// clinical vocabulary.
    pub fn with_keywords(extra_keywords: Vec<String>) -> Self {
        Self {
            extra_keywords: extra_keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Decide the route for a message.
    ///
    /// Grounded requires a clinical-topic hit: either vocabulary plus a
    /// question shape, or an explicit manual/criteria reference on its
    /// own. Everything else stays conversational.
    pub fn route(&self, message: &str) -> RouteDecision {
        let normalized = message.to_lowercase();

        let clinical_hit = CLINICAL_KEYWORDS
            .iter()
            .any(|k| normalized.contains(k))
            || self.extra_keywords.iter().any(|k| normalized.contains(k.as_str()));
        let explicit_reference = normalized.contains("dsm") || normalized.contains("tiêu chuẩn chẩn đoán");
        let question_shaped = QUESTION_RE.is_match(&normalized);

        let decision = if explicit_reference || (clinical_hit && question_shaped) {
            RouteDecision::Grounded
        } else {
            RouteDecision::Conversational
        };
        debug!(?decision, clinical_hit, question_shaped, "routed message");
        decision
    }
}
