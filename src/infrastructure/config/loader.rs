use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Corpus path cannot be empty")]
    EmptyCorpusPath,

    #[error("Invalid top-k: {0} must be at least 1")]
    InvalidTopK(&'static str),

    #[error("Invalid relevance threshold: {0}. Must be within [0, 1]")]
    InvalidRelevanceThreshold(f32),

    #[error("Invalid history ratio: {0}. Must be within (0, 1)")]
    InvalidHistoryRatio(f64),

    #[error("Invalid token limit: must be at least flush_size ({0})")]
    InvalidTokenLimit(usize),

    #[error("Invalid temperature: {0}. Must be within [0, 2]")]
    InvalidTemperature(f64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .tamly/config.yaml (project config)
    /// 3. .tamly/local.yaml (project local overrides, optional)
    /// 4. Environment variables (TAMLY_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".tamly/config.yaml"))
            .merge(Yaml::file(".tamly/local.yaml"))
            .merge(Env::prefixed("TAMLY_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("TAMLY_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.retrieval.corpus_path.is_empty() {
            return Err(ConfigError::EmptyCorpusPath);
        }
        if config.retrieval.vector_top_k == 0 {
            return Err(ConfigError::InvalidTopK("vector_top_k"));
        }
        if config.retrieval.lexical_top_k == 0 {
            return Err(ConfigError::InvalidTopK("lexical_top_k"));
        }
        if config.retrieval.fusion_top_k == 0 {
            return Err(ConfigError::InvalidTopK("fusion_top_k"));
        }
        if config.retrieval.rerank_top_n == 0 {
            return Err(ConfigError::InvalidTopK("rerank_top_n"));
        }
        if !(0.0..=1.0).contains(&config.retrieval.relevance_threshold) {
            return Err(ConfigError::InvalidRelevanceThreshold(
                config.retrieval.relevance_threshold,
            ));
        }

        if config.memory.history_ratio <= 0.0 || config.memory.history_ratio >= 1.0 {
            return Err(ConfigError::InvalidHistoryRatio(config.memory.history_ratio));
        }
        if config.memory.token_limit < config.memory.flush_size {
            return Err(ConfigError::InvalidTokenLimit(config.memory.flush_size));
        }

        if config.generation.requests_per_second <= 0.0 {
            return Err(ConfigError::InvalidRateLimit(
                config.generation.requests_per_second,
            ));
        }
        if !(0.0..=2.0).contains(&config.generation.temperature) {
            return Err(ConfigError::InvalidTemperature(config.generation.temperature));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }

    /// A commented sample config, for `tamly config sample`.
    pub fn sample_yaml() -> Result<String> {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize sample config")?;
        Ok(format!(
            "# Tamly configuration\n# Place at .tamly/config.yaml; override per-machine in .tamly/local.yaml\n# or via TAMLY_* environment variables (e.g. TAMLY_GENERATION__API_KEY).\n{yaml}"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{LoggingConfig, MemoryConfig, RetrievalConfig};
    use std::io::Write;

    #[test]
    fn test_validate_default_config() {
        assert!(ConfigLoader::validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_history_ratio() {
        let config = Config {
            memory: MemoryConfig { history_ratio: 1.5, ..MemoryConfig::default() },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidHistoryRatio(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let config = Config {
            retrieval: RetrievalConfig { fusion_top_k: 0, ..RetrievalConfig::default() },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTopK("fusion_top_k"))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_log_format() {
        let config = Config {
            logging: LoggingConfig { format: "xml".to_string(), ..LoggingConfig::default() },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_load_from_file_merges_over_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".yaml").unwrap();
        write!(file, "retrieval:\n  fusion_top_k: 4\n").unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.retrieval.fusion_top_k, 4);
        assert_eq!(config.retrieval.vector_top_k, 10);
    }

    #[test]
    fn test_sample_yaml_round_trips() {
        let sample = ConfigLoader::sample_yaml().unwrap();
        let parsed: Config = serde_yaml::from_str(&sample).unwrap();
        assert!(ConfigLoader::validate(&parsed).is_ok());
    }
}
