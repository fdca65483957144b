//! Core pipeline services.

pub mod citations;
pub mod memory;
pub mod orchestrator;
pub mod reranker;
pub mod retriever;
pub mod router;
pub mod safety;

pub use citations::CitationSynthesizer;
pub use memory::{ChatMemory, SessionStore};
pub use orchestrator::{ChatOrchestrator, TurnStream};
pub use reranker::{RerankOutcome, Reranker};
pub use retriever::HybridRetriever;
pub use router::{QueryRouter, RouteDecision};
pub use safety::SafetyClassifier;
