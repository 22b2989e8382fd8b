use crate::config::Config;
use crate::error::{Error, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_splitter(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::ConfigValidation { errors })
        }
    }

    fn validate_splitter(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.splitter.chunk_size == 0 {
            errors.push(ValidationError::new(
                "splitter.chunk_size",
                "Chunk size must be greater than 0",
            ));
        }

        if config.splitter.chunk_overlap >= config.splitter.chunk_size {
            errors.push(ValidationError::new(
                "splitter.chunk_overlap",
                "Chunk overlap must be smaller than chunk size",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Embedding model name cannot be empty",
            ));
        }

        if config.embedding.dimension == 0 {
            errors.push(ValidationError::new(
                "embedding.dimension",
                "Embedding dimension must be greater than 0",
            ));
        }

        if config.embedding.sparse_max_dim == 0 {
            errors.push(ValidationError::new(
                "embedding.sparse_max_dim",
                "Sparse dimension bound must be greater than 0",
            ));
        }

        if config.embedding.batch_size == 0 {
            errors.push(ValidationError::new(
                "embedding.batch_size",
                "Batch size must be greater than 0",
            ));
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.retrieval.rrf_k <= 0.0 {
            errors.push(ValidationError::new(
                "retrieval.rrf_k",
                "RRF constant must be positive",
            ));
        }

        if config.retrieval.search_multiplier == 0 {
            errors.push(ValidationError::new(
                "retrieval.search_multiplier",
                "Search multiplier must be greater than 0",
            ));
        }

        if config.retrieval.default_limit == 0 {
            errors.push(ValidationError::new(
                "retrieval.default_limit",
                "Default limit must be greater than 0",
            ));
        }

        if config.retrieval.default_collection.is_empty() {
            errors.push(ValidationError::new(
                "retrieval.default_collection",
                "Default collection name cannot be empty",
            ));
        }

        if config.retrieval.enable_reranking && config.retrieval.reranker_model.is_empty() {
            errors.push(ValidationError::new(
                "retrieval.reranker_model",
                "Reranker model name cannot be empty when reranking is enabled",
            ));
        }
    }
}
