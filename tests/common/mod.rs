//! Shared mock ports for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tamly::domain::error::{GenerationError, IndexError, RerankError};
use tamly::domain::models::PassageHit;
use tamly::domain::ports::{ChatMessage, GenerationClient, PassageIndex, RelevanceModel, TokenStream};

/// One scripted streaming reply.
pub enum StreamScript {
    /// Yield these tokens, then end.
    Tokens(Vec<&'static str>),
    /// Yield these tokens, then fail with the given message.
    FailAfter(Vec<&'static str>, &'static str),
}

/// Scripted generation client: `complete`/`chat` pop from one reply
/// queue, `stream_chat` pops from a stream-script queue. Everything is
/// counted and chat message lists are recorded for inspection.
pub struct MockGeneration {
    replies: Mutex<VecDeque<String>>,
    streams: Mutex<VecDeque<StreamScript>>,
    pub complete_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    pub stream_calls: AtomicUsize,
    pub chat_requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockGeneration {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| (*r).to_string()).collect()),
            streams: Mutex::new(VecDeque::new()),
            complete_calls: AtomicUsize::new(0),
            chat_calls: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
            chat_requests: Mutex::new(Vec::new()),
        })
    }

    pub fn push_stream(&self, script: StreamScript) {
        self.streams.lock().unwrap().push_back(script);
    }

    fn next_reply(&self) -> Result<String, GenerationError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GenerationError::Api("mock reply queue exhausted".to_string()))
    }

    pub fn total_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
            + self.chat_calls.load(Ordering::SeqCst)
            + self.stream_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for MockGeneration {
    async fn complete(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        self.next_reply()
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.chat_requests.lock().unwrap().push(messages.to_vec());
        self.next_reply()
    }

    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<TokenStream, GenerationError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.chat_requests.lock().unwrap().push(messages.to_vec());
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GenerationError::Api("mock stream queue exhausted".to_string()))?;

        let items: Vec<Result<String, GenerationError>> = match script {
            StreamScript::Tokens(tokens) => tokens.into_iter().map(|t| Ok(t.to_string())).collect(),
            StreamScript::FailAfter(tokens, message) => tokens
                .into_iter()
                .map(|t| Ok(t.to_string()))
                .chain(std::iter::once(Err(GenerationError::Stream(message.to_string()))))
                .collect(),
        };
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// Index returning a fixed hit list, counting searches.
pub struct StaticIndex {
    hits: Vec<PassageHit>,
    pub calls: AtomicUsize,
}

impl StaticIndex {
    pub fn new(ids: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            hits: ids.iter().map(|id| hit(id)).collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PassageIndex for StaticIndex {
    async fn search(&self, _query: &str, k: usize) -> Result<Vec<PassageHit>, IndexError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.hits.iter().take(k).cloned().collect())
    }
}

/// Relevance model returning fixed scores in input order, counting calls.
pub struct StaticRelevance {
    scores: Vec<f32>,
    pub calls: AtomicUsize,
}

impl StaticRelevance {
    pub fn new(scores: &[f32]) -> Arc<Self> {
        Arc::new(Self { scores: scores.to_vec(), calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl RelevanceModel for StaticRelevance {
    async fn score(&self, _query: &str, passages: &[String]) -> Result<Vec<f32>, RerankError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .scores
            .iter()
            .copied()
            .chain(std::iter::repeat(0.0))
            .take(passages.len())
            .collect())
    }
}

pub fn hit(id: &str) -> PassageHit {
    PassageHit {
        id: id.to_string(),
        text: format!("Nội dung DSM-5 cho đoạn {id}"),
        source_file: "dsm5.docx".to_string(),
        score: Some(0.5),
    }
}
