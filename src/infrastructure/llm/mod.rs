//! Groq OpenAI-compatible API adapter.

pub mod client;
pub mod errors;
pub mod rate_limiter;
pub mod streaming;
pub mod types;

pub use client::GroqClient;
pub use errors::LlmApiError;
