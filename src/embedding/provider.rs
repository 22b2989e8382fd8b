//! Embedding capability trait and FastEmbed implementation

use crate::config::EmbeddingConfig;
use fastembed::{
    EmbeddingModel, InitOptions, SparseInitOptions, SparseTextEmbedding, TextEmbedding,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitializationError(String),

    #[error("Embedding generation failed: {0}")]
    GenerationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Dual representation of one embedded text
#[derive(Debug, Clone)]
pub struct DualEmbedding {
    /// Fixed-dimension dense vector
    pub dense: Vec<f32>,

    /// Token-id to weight mapping, prior to sparse-vector encoding
    pub sparse: HashMap<u32, f32>,
}

/// Trait for dual dense + sparse embedding providers
///
/// Decouples the pipeline from any specific model runtime; tests use a
/// deterministic stub.
pub trait EmbeddingProvider: Send + Sync {
    /// Batch-embed passage texts, one dual embedding per input in order
    fn embed_passages(&self, texts: &[String]) -> Result<Vec<DualEmbedding>, EmbeddingError>;

    /// Embed a single query into the same vector spaces as the passages
    fn embed_query(&self, text: &str) -> Result<DualEmbedding, EmbeddingError>;

    /// Dense embedding dimension
    fn dimension(&self) -> usize;

    /// Dense model name
    fn model_name(&self) -> &str;
}

/// FastEmbed provider generating both vector spaces locally
///
/// Dense vectors come from a BGE model, sparse weights from SPLADE++.
/// Models are downloaded on demand to `~/.cache/huggingface/` on first use.
pub struct FastEmbedProvider {
    dense_model: Arc<TextEmbedding>,
    sparse_model: Arc<SparseTextEmbedding>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedProvider {
    /// Create a provider with the named dense model
    ///
    /// Supported: bge-large-en-v1.5 (1024D), bge-base-en-v1.5 (768D),
    /// bge-small-en-v1.5 (384D).
    pub fn new(model_name: &str) -> Result<Self, EmbeddingError> {
        let (embedding_model, dimension) = match model_name {
            "bge-large-en-v1.5" => (EmbeddingModel::BGELargeENV15, 1024),
            "bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768),
            "bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384),
            _ => {
                return Err(EmbeddingError::InitializationError(format!(
                    "Unsupported model: {}. Supported: bge-large-en-v1.5, bge-base-en-v1.5, bge-small-en-v1.5",
                    model_name
                )));
            }
        };

        tracing::info!(
            "Initializing embedding models: {} ({}D dense) + SPLADE++ (sparse)",
            model_name,
            dimension
        );

        let dense_options = InitOptions::new(embedding_model).with_show_download_progress(true);
        let dense_model = TextEmbedding::try_new(dense_options)
            .map_err(|e| EmbeddingError::InitializationError(e.to_string()))?;

        let sparse_options = SparseInitOptions::new(fastembed::SparseModel::SPLADEPPV1)
            .with_show_download_progress(true);
        let sparse_model = SparseTextEmbedding::try_new(sparse_options)
            .map_err(|e| EmbeddingError::InitializationError(e.to_string()))?;

        Ok(Self {
            dense_model: Arc::new(dense_model),
            sparse_model: Arc::new(sparse_model),
            model_name: model_name.to_string(),
            dimension,
        })
    }

    /// Create provider with the default dense model (bge-large-en-v1.5)
    pub fn with_default_model() -> Result<Self, EmbeddingError> {
        Self::new("bge-large-en-v1.5")
    }

    /// Create the provider the configuration names
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        Self::new(&config.model)
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed_passages(&self, texts: &[String]) -> Result<Vec<DualEmbedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        if texts.iter().any(|t| t.is_empty()) {
            return Err(EmbeddingError::InvalidInput(
                "Passage texts cannot be empty".to_string(),
            ));
        }

        let dense = self
            .dense_model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::GenerationError(e.to_string()))?;

        let sparse = self
            .sparse_model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::GenerationError(e.to_string()))?;

        if dense.len() != texts.len() || sparse.len() != texts.len() {
            return Err(EmbeddingError::GenerationError(format!(
                "Embedding count mismatch: expected {}, got {} dense / {} sparse",
                texts.len(),
                dense.len(),
                sparse.len()
            )));
        }

        dense
            .into_iter()
            .zip(sparse)
            .map(|(dense_vec, sparse_emb)| {
                if dense_vec.len() != self.dimension {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: self.dimension,
                        actual: dense_vec.len(),
                    });
                }

                let sparse_map = sparse_emb
                    .indices
                    .into_iter()
                    .zip(sparse_emb.values)
                    .map(|(index, value)| (index as u32, value))
                    .collect();

                Ok(DualEmbedding {
                    dense: dense_vec,
                    sparse: sparse_map,
                })
            })
            .collect()
    }

    fn embed_query(&self, text: &str) -> Result<DualEmbedding, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }

        let mut embeddings = self.embed_passages(&[text.to_string()])?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::GenerationError("No embeddings generated".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_model_name_rejected() {
        let result = FastEmbedProvider::new("not-a-model");
        assert!(matches!(result, Err(EmbeddingError::InitializationError(_))));
    }

    #[test]
    fn test_from_config_uses_configured_model_name() {
        let mut config = EmbeddingConfig::default();
        config.model = "bogus".to_string();
        assert!(FastEmbedProvider::from_config(&config).is_err());
    }

    #[test]
    #[ignore] // Requires model download - run with: cargo test -- --ignored
    fn test_provider_creation() {
        let provider = FastEmbedProvider::new("bge-small-en-v1.5");
        assert!(provider.is_ok());

        let provider = provider.unwrap();
        assert_eq!(provider.dimension(), 384);
        assert_eq!(provider.model_name(), "bge-small-en-v1.5");
    }

    #[test]
    #[ignore] // Requires model download - run with: cargo test -- --ignored
    fn test_query_embedding_has_both_spaces() {
        let provider = FastEmbedProvider::new("bge-small-en-v1.5").unwrap();
        let embedding = provider.embed_query("a test sentence for embedding").unwrap();

        assert_eq!(embedding.dense.len(), 384);
        assert!(!embedding.sparse.is_empty());
    }

    #[test]
    #[ignore] // Requires model download - run with: cargo test -- --ignored
    fn test_empty_text_rejected() {
        let provider = FastEmbedProvider::new("bge-small-en-v1.5").unwrap();
        assert!(provider.embed_query("").is_err());
    }
}
