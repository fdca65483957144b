//! Port traits decoupling the pipeline from concrete backends.

pub mod embedding;
pub mod generation;
pub mod index;
pub mod reranking;

pub use embedding::EmbeddingClient;
pub use generation::{ChatMessage, GenerationClient, TokenStream};
pub use index::PassageIndex;
pub use reranking::RelevanceModel;
