//! HTTP reranker adapter (Jina/Cohere-style `/rerank` endpoint).
//!
//! The endpoint returns `{index, relevance_score}` rows in its own
//! relevance order; the adapter reassembles scores into input order so
//! the port contract (one score per passage, positionally aligned)
//! holds.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::error::RerankError;
use crate::domain::models::RetrievalConfig;
use crate::domain::ports::RelevanceModel;

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    results: Vec<RerankRow>,
}

#[derive(Debug, Deserialize)]
struct RerankRow {
    index: usize,
    relevance_score: f32,
}

pub struct HttpReranker {
    http_client: ReqwestClient,
    base_url: String,
    model: String,
    api_key: String,
}

impl HttpReranker {
    pub fn new(config: &RetrievalConfig, api_key: String, timeout_secs: u64) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reranker HTTP client")?;
        Ok(Self {
            http_client,
            base_url: config.rerank_base_url.clone(),
            model: config.rerank_model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl RelevanceModel for HttpReranker {
    #[instrument(skip(self, passages), fields(passages = passages.len()))]
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>, RerankError> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let request = RerankRequest { model: &self.model, query, documents: passages };
        let response = self
            .http_client
            .post(format!("{}/rerank", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RerankError::Api(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RerankError::Api(format!("rerank returned {status}: {body}")));
        }

        let parsed: RerankResponse = response
            .json()
            .await
            .map_err(|e| RerankError::Malformed(e.to_string()))?;

        // Rows come back sorted by relevance; realign to input order.
        let mut scores = vec![0.0f32; passages.len()];
        for row in parsed.results {
            let slot = scores.get_mut(row.index).ok_or_else(|| {
                RerankError::Malformed(format!(
                    "result index {} out of range for {} documents",
                    row.index,
                    passages.len()
                ))
            })?;
            *slot = row.relevance_score;
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| (*t).to_string()).collect()
    }

    #[tokio::test]
    async fn test_scores_realigned_to_input_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rerank")
            .with_status(200)
            .with_body(
                r#"{"results":[{"index":2,"relevance_score":0.9},{"index":0,"relevance_score":0.4},{"index":1,"relevance_score":0.1}]}"#,
            )
            .create_async()
            .await;

        let config = RetrievalConfig { rerank_base_url: server.url(), ..RetrievalConfig::default() };
        let reranker = HttpReranker::new(&config, "key".to_string(), 10).unwrap();
        let scores = reranker
            .score("query", &passages(&["a", "b", "c"]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(scores, vec![0.4, 0.1, 0.9]);
    }

    #[tokio::test]
    async fn test_out_of_range_index_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rerank")
            .with_status(200)
            .with_body(r#"{"results":[{"index":5,"relevance_score":0.9}]}"#)
            .create_async()
            .await;

        let config = RetrievalConfig { rerank_base_url: server.url(), ..RetrievalConfig::default() };
        let reranker = HttpReranker::new(&config, "key".to_string(), 10).unwrap();
        let err = reranker.score("query", &passages(&["a"])).await.unwrap_err();
        assert!(matches!(err, RerankError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_http_error_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rerank")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let config = RetrievalConfig { rerank_base_url: server.url(), ..RetrievalConfig::default() };
        let reranker = HttpReranker::new(&config, "key".to_string(), 10).unwrap();
        let err = reranker.score("query", &passages(&["a"])).await.unwrap_err();
        assert!(matches!(err, RerankError::Api(_)));
    }

    #[tokio::test]
    async fn test_empty_passages_skip_http() {
        let config = RetrievalConfig {
            rerank_base_url: "http://127.0.0.1:1".to_string(),
            ..RetrievalConfig::default()
        };
        let reranker = HttpReranker::new(&config, "key".to_string(), 10).unwrap();
        assert!(reranker.score("query", &[]).await.unwrap().is_empty());
    }
}
