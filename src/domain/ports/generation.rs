//! Port trait for the generation model.
//!
//! The domain layer depends on this trait, not on a concrete HTTP
//! client; the infrastructure layer adapts it to an OpenAI-compatible
//! API. Implementations must be `Send + Sync` so a single client can
//! serve concurrent turns.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::domain::error::GenerationError;

/// A single message sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// "system", "user", or "assistant".
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// Ordered stream of text deltas from a streaming completion. The
/// accumulated deltas form the full response once the stream ends.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, GenerationError>> + Send>>;

/// Stateless request/response text generation.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Single-prompt completion (the prompt becomes one user message).
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Multi-message chat completion.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, GenerationError>;

    /// Streaming chat completion yielding text deltas in order.
    ///
    /// Errors can occur both when initiating the stream (returned as
    /// `Err`) and mid-stream (yielded as stream items).
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<TokenStream, GenerationError>;
}
