//! Safety verdict domain model.
//!
//! Every user turn is classified before any retrieval or generation
//! happens. The verdict level is totally ordered (`Safe < Warning <
//! Crisis`) so downstream branching can compare levels directly.

use serde::{Deserialize, Serialize};

/// Risk level assigned to a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    /// No risk signals detected.
    Safe,
    /// Distress signals that warrant a supportive message alongside the reply.
    Warning,
    /// Acute risk. The turn is answered with fixed emergency resources only.
    Crisis,
}

impl SafetyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Warning => "warning",
            Self::Crisis => "crisis",
        }
    }
}

impl std::fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stage of the cascade produced the final level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictSource {
    /// Stage 1 keyword scan only (no model call was made).
    Keyword,
    /// Stage 2 contextual arbitration by the generation model.
    Llm,
}

/// Outcome of the two-stage safety cascade for one user message.
///
/// The match lists always reflect the stage-1 keyword scan, even when the
/// final level came from stage-2 arbitration; they are kept for
/// observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyVerdict {
    pub level: SafetyLevel,
    pub source: VerdictSource,
    /// Source strings of the crisis patterns that matched.
    pub crisis_matches: Vec<String>,
    /// Source strings of the warning patterns that matched.
    pub warning_matches: Vec<String>,
}

impl SafetyVerdict {
    /// A verdict for text with no keyword hits at all.
    pub fn safe() -> Self {
        Self {
            level: SafetyLevel::Safe,
            source: VerdictSource::Keyword,
            crisis_matches: Vec::new(),
            warning_matches: Vec::new(),
        }
    }

    pub fn is_crisis(&self) -> bool {
        self.level == SafetyLevel::Crisis
    }

    pub fn is_warning(&self) -> bool {
        self.level == SafetyLevel::Warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(SafetyLevel::Safe < SafetyLevel::Warning);
        assert!(SafetyLevel::Warning < SafetyLevel::Crisis);
        assert_eq!(
            [SafetyLevel::Crisis, SafetyLevel::Safe, SafetyLevel::Warning]
                .iter()
                .max(),
            Some(&SafetyLevel::Crisis)
        );
    }

    #[test]
    fn test_safe_verdict() {
        let verdict = SafetyVerdict::safe();
        assert_eq!(verdict.level, SafetyLevel::Safe);
        assert_eq!(verdict.source, VerdictSource::Keyword);
        assert!(verdict.crisis_matches.is_empty());
        assert!(verdict.warning_matches.is_empty());
        assert!(!verdict.is_crisis());
    }

    #[test]
    fn test_level_serde_round_trip() {
        let json = serde_json::to_string(&SafetyLevel::Crisis).unwrap();
        assert_eq!(json, "\"crisis\"");
        let level: SafetyLevel = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(level, SafetyLevel::Warning);
    }
}
