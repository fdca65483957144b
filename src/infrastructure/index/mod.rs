//! File-backed passage indices over the pre-built corpus.

pub mod corpus;
pub mod lexical;
pub mod vector;

pub use corpus::{load_corpus, PassageRecord};
pub use lexical::LexicalIndex;
pub use vector::VectorIndex;
