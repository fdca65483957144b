//! HTTP client for the Groq OpenAI-compatible API.
//!
//! One reqwest client with connection pooling serves chat completions,
//! streaming completions, and embeddings. Requests pass through a token
//! bucket rate limiter and a per-request timeout; failures are mapped
//! to typed errors and never retried here — retry decisions belong to
//! callers, and the pipeline deliberately makes none.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use tracing::{debug, instrument};

use super::errors::LlmApiError;
use super::rate_limiter::TokenBucketRateLimiter;
use super::streaming::token_stream;
use super::types::{
    ApiMessage, ChatCompletionRequest, ChatCompletionResponse, EmbeddingRequest, EmbeddingResponse,
};
use crate::domain::error::{EmbeddingError, GenerationError};
use crate::domain::models::GenerationConfig;
use crate::domain::ports::{ChatMessage, EmbeddingClient, GenerationClient, TokenStream};

pub struct GroqClient {
    http_client: ReqwestClient,
    config: GenerationConfig,
    rate_limiter: TokenBucketRateLimiter,
}

impl GroqClient {
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http_client,
            rate_limiter: TokenBucketRateLimiter::new(config.requests_per_second),
            config,
        })
    }

    fn chat_request(&self, messages: &[ChatMessage], stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages
                .iter()
                .map(|m| ApiMessage { role: m.role.clone(), content: m.content.clone() })
                .collect(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream,
        }
    }

    /// The API key must never reach logs or error messages.
    fn scrub(&self, body: String) -> String {
        if self.config.api_key.is_empty() {
            body
        } else {
            body.replace(&self.config.api_key, "[redacted]")
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> LlmApiError {
        if err.is_timeout() {
            LlmApiError::Timeout(self.config.timeout_secs)
        } else {
            LlmApiError::Network(err)
        }
    }

    async fn post_chat(
        &self,
        messages: &[ChatMessage],
        stream: bool,
    ) -> Result<reqwest::Response, LlmApiError> {
        self.rate_limiter.acquire().await;

        let request = self.chat_request(messages, stream);
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmApiError::from_status(status, self.scrub(body)));
        }
        Ok(response)
    }
}

#[async_trait]
impl GenerationClient for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        self.chat(&[ChatMessage::user(prompt)]).await
    }

    #[instrument(skip(self, messages), fields(messages = messages.len()))]
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        let response = self.post_chat(messages, false).await.map_err(GenerationError::from)?;
        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::Malformed("response contained no choices".to_string()))?;
        debug!(chars = choice.message.content.len(), "chat completion received");
        Ok(choice.message.content)
    }

    #[instrument(skip(self, messages), fields(messages = messages.len()))]
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<TokenStream, GenerationError> {
        let response = self.post_chat(messages, true).await.map_err(GenerationError::from)?;
        Ok(token_stream(response))
    }
}

#[async_trait]
impl EmbeddingClient for GroqClient {
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.rate_limiter.acquire().await;

        let request = EmbeddingRequest {
            model: self.config.embedding_model.clone(),
            input: text.to_string(),
        };
        let response = self
            .http_client
            .post(format!("{}/embeddings", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbeddingError::from(self.map_send_error(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmApiError::from_status(status, self.scrub(body)).into());
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Malformed(e.to_string()))?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::Malformed("response contained no embeddings".to_string()))
    }
}
