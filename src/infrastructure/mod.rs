//! Adapters binding the domain ports to concrete backends.

pub mod config;
pub mod index;
pub mod llm;
pub mod rerank;

pub use config::ConfigLoader;
pub use index::{LexicalIndex, VectorIndex};
pub use llm::GroqClient;
pub use rerank::HttpReranker;
