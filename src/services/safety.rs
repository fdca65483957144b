//! Two-stage safety cascade.
//!
//! Stage 1 is a cheap keyword pre-filter: normalized text is scanned
//! against disjoint crisis and warning pattern sets. Text with no hits
//! is safe immediately and never pays for a model call. Stage 2 asks
//! the generation model to arbitrate ambiguous hits with a fixed,
//! label-constrained instruction — keyword hits alone over-trigger on
//! academic or mild phrasing (a single "mệt mỏi quá" is not an
//! emergency).
//!
//! Arbitration is wrapped in a timeout and never retried; a failed or
//! malformed arbitration falls back to the configured policy level.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::domain::models::{ClassifierFailurePolicy, SafetyConfig, SafetyLevel, SafetyVerdict, VerdictSource};
use crate::domain::ports::GenerationClient;

/// Crisis patterns: self-harm intent, suicidal ideation, concrete methods.
const CRISIS_PATTERNS: &[&str] = &[
    r"tự\s*hại",
    r"tự\s*tử",
    r"tự\s*sát",
    r"muốn\s*chết",
    r"muốn\s*tự\s*tử",
    r"muốn\s*tự\s*sát",
    r"không\s*muốn\s*sống",
    r"muốn\s*kết\s*liễu",
    r"kết\s*liễu\s*(chính\s*)?mình",
    r"kết\s*thúc\s*mọi\s*thứ",
    r"muốn\s*die\b",
    r"ý\s*định\s*tự\s*(tử|sát)",
    r"suy\s*nghĩ\s*tự\s*(tử|sát)",
    r"nghĩ\s*đến\s*cái\s*chết",
    r"nghĩ\s*đến\s*việc\s*tự\s*(tử|sát)",
    r"bàn\s*về\s*cái\s*chết",
    r"kế\s*hoạch\s*(tự\s*hại|tự\s*tử|tự\s*sát)",
    r"lên\s*kế\s*hoạch\s*(tự\s*hại|tự\s*tử|tự\s*kết\s*liễu)",
    r"nỗ\s*lực\s*tự\s*(tử|sát)",
    r"cố\s*gắng\s*tự\s*(tử|sát)",
    r"đe\s*dọa\s*tự\s*(tử|sát)",
    r"đe\s*dọa\s*sẽ\s*tự\s*(tử|sát)",
    r"hành\s*vi\s*tự\s*(tử|sát)",
    r"tự\s*giết\s*mình",
    r"tự\s*giết\s*chết\s*bản\s*thân",
    r"tự\s*làm\s*mình\s*chết",
    r"nhảy\s*lầu",
    r"nhảy\s*sông",
    r"treo\s*cổ",
    r"cắt\s*cổ\s*tay",
    r"tự\s*cắt\s*tay",
    r"rạch\s*tay",
    r"rạch\s*cổ\s*tay",
    r"uống\s*thuốc\s*độc",
    r"uống\s*thật\s*nhiều\s*thuốc",
    r"đập\s*đầu",
    r"cắn\s*lưỡi",
    r"đốt\s*mình",
    r"muốn\s*ngủ\s*một\s*giấc\s*không\s*bao\s*giờ\s*tỉnh",
    r"ước\s*gì\s*mình\s*biến\s*mất\s*vĩnh\s*viễn",
];

/// Warning patterns: sustained distress, anxiety, depressive and
/// psychotic symptom language.
const WARNING_PATTERNS: &[&str] = &[
    r"tuyệt\s*vọng",
    r"stress",
    r"hoảng\s*sợ",
    r"hoảng\s*loạn",
    r"lo\s*lắng",
    r"lo\s*âu",
    r"khó\s*thở",
    r"mệt\s*mỏi\s*quá",
    r"chán\s*nản",
    r"cảm\s*thấy\s*tuyệt\s*vọng",
    r"cuộc\s*sống\s*không\s*còn\s*ý\s*nghĩa",
    r"tôi\s*là\s*gánh\s*nặng",
    r"không\s*chịu\s*nổi\s*đau\s*đớn",
    r"muốn\s*biến\s*mất",
    r"muốn\s*biến\s*mất\s*khỏi\s*đây",
    r"cảm\s*thấy\s*cô\s*lập",
    r"xa\s*lánh\s*mọi\s*người",
    r"buồn\s*bã\s*kéo\s*dài",
    r"chán\s*nản\s*mọi\s*thứ",
    r"mất\s*hứng\s*thú\s*với\s*cuộc\s*sống",
    r"mất\s*đi\s*sự\s*thích\s*thú\s*với\s*xung\s*quanh",
    r"không\s*chăm\s*sóc\s*bản\s*thân",
    r"bế\s*tắc\s*cuộc\s*sống",
    r"mất\s*phương\s*hướng",
    r"đau\s*khổ\s*tột\s*độ",
    r"trầm\s*uất",
    r"trầm\s*cảm",
    r"chấn\s*thương",
    r"khủng\s*hoảng",
    r"ý\s*nghĩ\s*tiêu\s*cực\s*kéo\s*dài",
    r"cảm\s*thấy\s*ích\s*kỷ\s*nếu\s*sống\s*tiếp",
    r"khó\s*khăn\s*đưa\s*ra\s*quyết\s*định",
    r"thay\s*đổi\s*thói\s*quen",
    r"cảm\s*xúc\s*trống\s*rỗng",
    r"thu\s*mình",
    r"đột\s*nhiên\s*bình\s*tĩnh",
    r"hành\s*vi\s*khác\s*thường",
    r"nói\s*năng\s*lộn\s*xộn",
    r"khó\s*hiểu",
    r"mơ\s*hồ",
    r"rối\s*loạn\s*cảm\s*xúc",
    r"rối\s*loạn\s*tâm\s*thần",
    r"nghe\s*thấy\s*tiếng\s*nói\s*xui\s*khiến",
    r"nghe\s*thấy\s*tiếng\s*nói\s*lạ",
    r"có\s*người\s*theo\s*dõi",
    r"bị\s*đầu\s*độc",
    r"hoang\s*tưởng",
    r"ảo\s*giác",
    r"ma\s*quỷ\s*xui\s*khiến",
    r"nghĩ\s*có\s*chip\s*trong\s*đầu",
];

static COMPILED_CRISIS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| compile(CRISIS_PATTERNS));
static COMPILED_WARNING: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| compile(WARNING_PATTERNS));

fn compile(patterns: &[&'static str]) -> Vec<(&'static str, Regex)> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(&format!("(?i){p}")) {
            Ok(re) => Some((*p, re)),
            Err(err) => {
                warn!(pattern = p, %err, "skipping invalid safety pattern");
                None
            }
        })
        .collect()
}

/// Lowercase and collapse whitespace before pattern scanning.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stage-2 instruction. The model must answer with exactly one label.
const ARBITER_SYSTEM_PROMPT: &str = "Bạn là bộ phân loại an toàn cho một trợ lý sức khỏe tâm thần. \
Đọc tin nhắn của người dùng và trả lời bằng đúng MỘT từ duy nhất:\n\
CRISIS - người dùng có ý định tự hại, tự tử, hoặc nguy cơ cấp tính\n\
WARNING - người dùng đang đau khổ, lo âu, hoặc có dấu hiệu đáng lo ngại nhưng chưa cấp tính\n\
SAFE - câu hỏi học thuật, trung tính, hoặc chỉ nhắc đến chủ đề một cách gián tiếp\n\
Không giải thích. Chỉ trả lời CRISIS, WARNING hoặc SAFE.";

/// Two-stage safety classifier.
pub struct SafetyClassifier {
    generation: Arc<dyn GenerationClient>,
    config: SafetyConfig,
}

impl SafetyClassifier {
    pub fn new(generation: Arc<dyn GenerationClient>, config: SafetyConfig) -> Self {
        Self { generation, config }
    }

    /// Classify raw user text.
    ///
    /// Returns a keyword-sourced `Safe` verdict without any model call
    /// when neither pattern set matches.
    pub async fn classify(&self, text: &str) -> SafetyVerdict {
        let normalized = normalize_text(text);

        let crisis_matches: Vec<String> = COMPILED_CRISIS
            .iter()
            .filter(|(_, re)| re.is_match(&normalized))
            .map(|(p, _)| (*p).to_string())
            .collect();
        let warning_matches: Vec<String> = COMPILED_WARNING
            .iter()
            .filter(|(_, re)| re.is_match(&normalized))
            .map(|(p, _)| (*p).to_string())
            .collect();

        if crisis_matches.is_empty() && warning_matches.is_empty() {
            return SafetyVerdict::safe();
        }

        debug!(
            crisis_hits = crisis_matches.len(),
            warning_hits = warning_matches.len(),
            "keyword hits, escalating to contextual arbitration"
        );

        let level = self.arbitrate(text).await;

        SafetyVerdict {
            level,
            source: VerdictSource::Llm,
            crisis_matches,
            warning_matches,
        }
    }

    /// Stage 2: one model call, label-normalized reply, policy default on
    /// any failure. Not retried.
    async fn arbitrate(&self, text: &str) -> SafetyLevel {
        let prompt = format!("{ARBITER_SYSTEM_PROMPT}\n\nTin nhắn của người dùng: {text}");
        let timeout = Duration::from_secs(self.config.arbiter_timeout_secs);

        let reply = match tokio::time::timeout(timeout, self.generation.complete(&prompt)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                warn!(%err, "safety arbitration call failed, applying failure policy");
                return self.failure_level();
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.config.arbiter_timeout_secs,
                    "safety arbitration timed out, applying failure policy"
                );
                return self.failure_level();
            }
        };

        match parse_label(&reply) {
            Some(level) => level,
            None => {
                warn!(reply = %reply.chars().take(80).collect::<String>(), "unparseable safety label, applying failure policy");
                self.failure_level()
            }
        }
    }

    fn failure_level(&self) -> SafetyLevel {
        match self.config.on_classifier_failure {
            ClassifierFailurePolicy::Safe => SafetyLevel::Safe,
            ClassifierFailurePolicy::Warning => SafetyLevel::Warning,
        }
    }
}

/// Normalize a model reply (uppercase, letters only) and map it to a level.
fn parse_label(reply: &str) -> Option<SafetyLevel> {
    let normalized: String = reply
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    match normalized.as_str() {
        "CRISIS" => Some(SafetyLevel::Crisis),
        "WARNING" => Some(SafetyLevel::Warning),
        "SAFE" => Some(SafetyLevel::Safe),
        _ => None,
    }
}
