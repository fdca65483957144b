//! SSE parsing for streaming chat completions.
//!
//! The endpoint emits `data: {json}` lines terminated by `data: [DONE]`.
//! Chunks arrive on arbitrary byte boundaries, so the parser buffers
//! until a full line is available and only then decodes. Non-delta
//! lines (comments, keep-alives, empty lines) are skipped.

use futures::StreamExt;
use tracing::warn;

use super::types::ChatCompletionChunk;
use crate::domain::error::GenerationError;
use crate::domain::ports::TokenStream;

/// Incremental parser over the SSE byte stream.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning the token deltas of every
    /// complete `data:` line seen so far.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut tokens = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim();

            let Some(payload) = line.strip_prefix("data:") else {
                continue;
            };
            let payload = payload.trim();
            if payload.is_empty() || payload == "[DONE]" {
                continue;
            }

            match serde_json::from_str::<ChatCompletionChunk>(payload) {
                Ok(chunk) => {
                    for choice in chunk.choices {
                        if let Some(content) = choice.delta.content {
                            if !content.is_empty() {
                                tokens.push(content);
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!(%err, "skipping unparseable SSE chunk");
                }
            }
        }
        tokens
    }
}

/// Adapt a streaming HTTP response into a token stream.
pub fn token_stream(response: reqwest::Response) -> TokenStream {
    let mut parser = SseParser::new();
    let stream = response.bytes_stream().flat_map(move |chunk| {
        let items: Vec<Result<String, GenerationError>> = match chunk {
            Ok(bytes) => parser.feed(&bytes).into_iter().map(Ok).collect(),
            Err(err) => vec![Err(GenerationError::Stream(err.to_string()))],
        };
        futures::stream::iter(items)
    });
    Box::pin(stream)
}
