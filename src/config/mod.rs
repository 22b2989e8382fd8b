//! Configuration management for Quarry
//!
//! All tunable parameters of the splitting and retrieval pipeline live here,
//! loaded from TOML with environment-independent defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub splitter: SplitterConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Document splitter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Trailing context repeated between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 400,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Dense model name (e.g., "bge-large-en-v1.5")
    pub model: String,
    /// Dense embedding dimension (1024 for BGE large)
    pub dimension: usize,
    /// Upper bound for sparse vector indices, one past the subword vocabulary
    pub sparse_max_dim: u32,
    /// Batch size for passage embedding
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "bge-large-en-v1.5".to_string(),
            dimension: 1024,
            sparse_max_dim: 250_002,
            batch_size: 32,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// RRF K constant (typically 60)
    pub rrf_k: f32,
    /// Candidate window multiplier applied before fusion
    pub search_multiplier: usize,
    /// Default result limit when the caller passes none or a non-positive one
    pub default_limit: usize,
    /// Collection name used when the caller names none
    pub default_collection: String,
    /// Whether a reranking model should be loaded
    pub enable_reranking: bool,
    /// Reranker model name
    pub reranker_model: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            search_multiplier: 2,
            default_limit: 5,
            default_collection: "default".to_string(),
            enable_reranking: false,
            reranker_model: "bge-reranker-base".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let config: Config = toml::from_str(&content)?;

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| Error::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
        assert_eq!(config.splitter.chunk_size, 2000);
        assert_eq!(config.splitter.chunk_overlap, 400);
        assert_eq!(config.retrieval.default_limit, 5);
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.embedding.dimension, config.embedding.dimension);
        assert_eq!(parsed.retrieval.rrf_k, config.retrieval.rrf_k);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: Config = toml::from_str("[splitter]\nchunk_size = 500\nchunk_overlap = 50\n").unwrap();
        assert_eq!(parsed.splitter.chunk_size, 500);
        assert_eq!(parsed.embedding.sparse_max_dim, 250_002);
    }
}
