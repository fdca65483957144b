use serde::{Deserialize, Serialize};

/// Main configuration structure for Tamly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Generation model (Groq OpenAI-compatible) settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Safety cascade settings.
    #[serde(default)]
    pub safety: SafetyConfig,

    /// Retrieval pipeline settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Session memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Generation model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. Usually supplied via `TAMLY_GENERATION__API_KEY`.
    #[serde(default)]
    pub api_key: String,

    /// Chat model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding model identifier (dense retrieval queries).
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Maximum tokens per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Per-call timeout in seconds. Expiry is a recoverable failure for
    /// the caller; calls are never retried.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Token-bucket rate limit in requests per second.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "meta-llama/llama-4-scout-17b-16e-instruct".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text-v1.5".to_string()
}

const fn default_temperature() -> f64 {
    0.6
}

const fn default_max_tokens() -> usize {
    1024
}

const fn default_timeout_secs() -> u64 {
    60
}

const fn default_requests_per_second() -> f64 {
    10.0
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Policy applied when the stage-2 contextual classifier fails or returns
/// output that maps to no known label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierFailurePolicy {
    /// Treat the turn as safe (permissive; keeps answering).
    Safe,
    /// Treat the turn as a warning (conservative-for-safety).
    Warning,
}

/// Safety cascade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SafetyConfig {
    /// Level assumed when stage-2 arbitration fails or is malformed.
    /// This is an explicit policy decision; the shipped default is
    /// `safe`.
    #[serde(default = "default_failure_policy")]
    pub on_classifier_failure: ClassifierFailurePolicy,

    /// Timeout for the stage-2 arbitration call, in seconds. Expiry is
    /// treated as a classification failure, not retried.
    #[serde(default = "default_arbiter_timeout_secs")]
    pub arbiter_timeout_secs: u64,
}

const fn default_failure_policy() -> ClassifierFailurePolicy {
    ClassifierFailurePolicy::Safe
}

const fn default_arbiter_timeout_secs() -> u64 {
    10
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            on_classifier_failure: default_failure_policy(),
            arbiter_timeout_secs: default_arbiter_timeout_secs(),
        }
    }
}

/// Retrieval pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetrievalConfig {
    /// Path to the pre-built passage corpus (JSON, produced by the
    /// external ingestion step).
    #[serde(default = "default_corpus_path")]
    pub corpus_path: String,

    /// Top-K for the dense (vector) index.
    #[serde(default = "default_vector_top_k")]
    pub vector_top_k: usize,

    /// Top-K for the lexical (BM25) index.
    #[serde(default = "default_lexical_top_k")]
    pub lexical_top_k: usize,

    /// Result bound after rank fusion.
    #[serde(default = "default_fusion_top_k")]
    pub fusion_top_k: usize,

    /// RRF smoothing constant.
    #[serde(default = "default_rrf_k")]
    pub rrf_k: u32,

    /// Result bound after reranking.
    #[serde(default = "default_rerank_top_n")]
    pub rerank_top_n: usize,

    /// Minimum reranker relevance for a passage to count as grounded.
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,

    /// Reranker endpoint base URL (Jina/Cohere-style `/rerank`).
    #[serde(default = "default_rerank_base_url")]
    pub rerank_base_url: String,

    /// Reranker model identifier.
    #[serde(default = "default_rerank_model")]
    pub rerank_model: String,

    /// Maximum citations returned per answer.
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    /// Citation text truncation limit, in characters.
    #[serde(default = "default_source_text_limit")]
    pub source_text_limit: usize,
}

fn default_corpus_path() -> String {
    ".tamly/index/passages.json".to_string()
}

const fn default_vector_top_k() -> usize {
    10
}

const fn default_lexical_top_k() -> usize {
    10
}

const fn default_fusion_top_k() -> usize {
    10
}

const fn default_rrf_k() -> u32 {
    60
}

const fn default_rerank_top_n() -> usize {
    5
}

const fn default_relevance_threshold() -> f32 {
    0.3
}

fn default_rerank_base_url() -> String {
    "https://api.jina.ai/v1".to_string()
}

fn default_rerank_model() -> String {
    "bge-reranker-v2-m3".to_string()
}

const fn default_max_sources() -> usize {
    3
}

const fn default_source_text_limit() -> usize {
    500
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            vector_top_k: default_vector_top_k(),
            lexical_top_k: default_lexical_top_k(),
            fusion_top_k: default_fusion_top_k(),
            rrf_k: default_rrf_k(),
            rerank_top_n: default_rerank_top_n(),
            relevance_threshold: default_relevance_threshold(),
            rerank_base_url: default_rerank_base_url(),
            rerank_model: default_rerank_model(),
            max_sources: default_max_sources(),
            source_text_limit: default_source_text_limit(),
        }
    }
}

/// Session memory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MemoryConfig {
    /// Total token budget per session.
    #[serde(default = "default_token_limit")]
    pub token_limit: usize,

    /// Minimum tokens freed per eviction pass.
    #[serde(default = "default_flush_size")]
    pub flush_size: usize,

    /// Share of the budget reserved for raw chat history; the remainder
    /// belongs to derived summary blocks.
    #[serde(default = "default_history_ratio")]
    pub history_ratio: f64,
}

const fn default_token_limit() -> usize {
    8000
}

const fn default_flush_size() -> usize {
    800
}

const fn default_history_ratio() -> f64 {
    0.7
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            token_limit: default_token_limit(),
            flush_size: default_flush_size(),
            history_ratio: default_history_ratio(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
