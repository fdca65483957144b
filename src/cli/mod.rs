//! Command-line interface.

pub mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::domain::models::{Config, LoggingConfig};
use crate::domain::ports::{EmbeddingClient, GenerationClient, PassageIndex, RelevanceModel};
use crate::infrastructure::{ConfigLoader, GroqClient, HttpReranker, LexicalIndex, VectorIndex};
use crate::services::ChatOrchestrator;

#[derive(Parser, Debug)]
#[command(name = "tamly", version, about = "Safety-gated Vietnamese mental-health assistant grounded in DSM-5")]
pub struct Cli {
    /// Load configuration from this file instead of the .tamly/ hierarchy
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a single question and print the full reply
    Ask(commands::ask::AskArgs),
    /// Interactive chat with streamed replies
    Chat(commands::chat::ChatArgs),
    /// Configuration utilities
    Config(commands::config::ConfigArgs),
}

/// Install the global tracing subscriber per the logging config.
///
/// `RUST_LOG` overrides the configured level; the format field picks
/// the pretty or JSON fmt layer. Once a subscriber is installed,
/// further calls are no-ops.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);
    let stderr = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    if logging.format == "json" {
        let _ = registry.with(stderr.json()).try_init();
    } else {
        let _ = registry.with(stderr).try_init();
    }
}

/// Resolve configuration from the CLI flag or the .tamly/ hierarchy.
pub fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Wire the full pipeline: one Groq client serves generation, safety
/// arbitration, and query embeddings; both indices read the same
/// pre-built corpus file.
pub fn build_orchestrator(config: &Config) -> Result<ChatOrchestrator> {
    let groq = Arc::new(GroqClient::new(config.generation.clone())?);
    let generation: Arc<dyn GenerationClient> = groq.clone();
    let embedder: Arc<dyn EmbeddingClient> = groq;

    let corpus_path = PathBuf::from(&config.retrieval.corpus_path);
    let dense: Arc<dyn PassageIndex> = Arc::new(
        VectorIndex::load(&corpus_path, embedder)
            .context("failed to load dense passage index")?,
    );
    let lexical: Arc<dyn PassageIndex> = Arc::new(
        LexicalIndex::load(&corpus_path).context("failed to load lexical passage index")?,
    );
    let relevance: Arc<dyn RelevanceModel> = Arc::new(HttpReranker::new(
        &config.retrieval,
        config.generation.api_key.clone(),
        config.generation.timeout_secs,
    )?);

    Ok(ChatOrchestrator::from_parts(
        config, generation, dense, lexical, relevance,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_accepts_both_formats() {
        // First call installs a subscriber, later calls are no-ops;
        // neither format may panic.
        init_tracing(&LoggingConfig { level: "debug".to_string(), format: "json".to_string() });
        init_tracing(&LoggingConfig::default());
    }
}
