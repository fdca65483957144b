//! Tamly - Safety-gated Vietnamese mental-health assistant
//!
//! Tamly answers mental-health questions in Vietnamese, grounded in a
//! pre-ingested DSM-5 passage corpus, with a safety cascade that gates
//! every turn before any retrieval or generation runs.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **Domain Layer** (`domain`): models, port traits, error taxonomy
//! - **Service Layer** (`services`): safety cascade, session memory,
//!   hybrid retrieval, reranking, citation synthesis, turn orchestration
//! - **Infrastructure Layer** (`infrastructure`): Groq API client,
//!   passage indices, HTTP reranker, configuration loading
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use tamly::domain::models::TurnRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = tamly::infrastructure::ConfigLoader::load()?;
//!     let orchestrator = tamly::cli::build_orchestrator(&config)?;
//!     let response = orchestrator.chat(TurnRequest::new("Trầm cảm là gì?")).await?;
//!     println!("{}", response.messages.last().map(|m| m.text.as_str()).unwrap_or(""));
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::error::{AssistantError, AssistantResult};
pub use domain::models::{
    CitationResponse, Config, PassageHit, SafetyLevel, SafetyVerdict, SourceInfo, TurnEvent,
    TurnRequest, TurnResponse,
};
pub use domain::ports::{EmbeddingClient, GenerationClient, PassageIndex, RelevanceModel};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ChatOrchestrator, HybridRetriever, SafetyClassifier, SessionStore};
