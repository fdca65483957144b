//! Domain models: pure data types with no I/O.

pub mod chat;
pub mod citation;
pub mod config;
pub mod passage;
pub mod safety;

pub use chat::{
    estimate_tokens, ChatRole, ChatTurn, TurnEvent, TurnMessage, TurnMessageKind, TurnRequest,
    TurnResponse,
};
pub use citation::{CitationResponse, SourceInfo};
pub use config::{
    ClassifierFailurePolicy, Config, GenerationConfig, LoggingConfig, MemoryConfig,
    RetrievalConfig, SafetyConfig,
};
pub use passage::{FusedResult, PassageHit, RerankedResult};
pub use safety::{SafetyLevel, SafetyVerdict, VerdictSource};
