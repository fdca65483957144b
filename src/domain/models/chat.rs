//! Conversation turn models and the orchestrator's caller-facing types.

use serde::{Deserialize, Serialize};

use super::citation::SourceInfo;
use super::safety::SafetyVerdict;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn of conversation held in session memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: ChatRole::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, text: text.into() }
    }

    /// Estimated token count of the turn text (~4 characters per token).
    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.text)
    }
}

/// Rough token estimate used for memory budgeting: 1 token ≈ 4 chars.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Input for one conversational turn, one-shot or streaming.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnRequest {
    pub message: String,
    /// Absent or unknown ids create a new session.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl TurnRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), session_id: None }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Kind of a message inside a turn response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnMessageKind {
    /// Fixed emergency-resources text; always terminal for the turn.
    Crisis,
    /// Fixed supportive text queued ahead of the reply.
    Warning,
    /// The assistant's answer.
    Reply,
}

/// One message emitted by a completed turn, in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnMessage {
    pub kind: TurnMessageKind,
    pub text: String,
}

/// Result of a one-shot turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    /// The session the turn ran in (newly generated when none was given).
    pub session_id: String,
    /// Ordered messages: optional crisis/warning first, then the reply.
    pub messages: Vec<TurnMessage>,
    /// Citations from the turn's retrieval, empty when none ran.
    pub sources: Vec<SourceInfo>,
    pub safety: SafetyVerdict,
}

/// Typed events of a streaming turn, in emission order:
/// `Safety`, optional `Crisis`/`Warning`, `Token`*, `Sources`, `Done`.
/// A generation failure after streaming started yields `Error` followed
/// by `Done` so the channel always closes cleanly.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    Safety { verdict: SafetyVerdict },
    Crisis { text: String },
    Warning { text: String },
    Token { text: String },
    Sources { sources: Vec<SourceInfo> },
    Error { message: String },
    Done { session_id: String },
}
