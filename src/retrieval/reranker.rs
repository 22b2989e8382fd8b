//! Reranking adapter over an external pairwise relevance scorer

use crate::config::RetrievalConfig;
use crate::store::EmbeddingRecord;
use fastembed::{RerankInitOptions, TextRerank};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum RerankError {
    #[error("Reranker initialization failed: {0}")]
    InitializationError(String),

    #[error("Reranking failed: {0}")]
    ScoringError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Capability interface for pairwise relevance scoring
///
/// Returns one score per passage, in input order.
pub trait RelevanceScorer: Send + Sync {
    fn score_pairs(&self, query: &str, passages: &[String]) -> Result<Vec<f32>, RerankError>;
}

/// Cross-encoder scorer backed by FastEmbed
pub struct FastEmbedScorer {
    model: Arc<TextRerank>,
    model_name: String,
}

impl FastEmbedScorer {
    /// Create a scorer with the named cross-encoder model
    ///
    /// Supported: bge-reranker-base, bge-reranker-v2-m3.
    pub fn new(model_name: &str) -> Result<Self, RerankError> {
        let reranker_model = match model_name {
            "bge-reranker-base" => fastembed::RerankerModel::BGERerankerBase,
            "bge-reranker-v2-m3" => fastembed::RerankerModel::BGERerankerV2M3,
            _ => {
                return Err(RerankError::InitializationError(format!(
                    "Unsupported reranker model: {}. Supported: bge-reranker-base, bge-reranker-v2-m3",
                    model_name
                )));
            }
        };

        tracing::info!("Initializing reranker model: {}", model_name);

        let init_options =
            RerankInitOptions::new(reranker_model).with_show_download_progress(true);

        let model = TextRerank::try_new(init_options)
            .map_err(|e| RerankError::InitializationError(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: model_name.to_string(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl RelevanceScorer for FastEmbedScorer {
    fn score_pairs(&self, query: &str, passages: &[String]) -> Result<Vec<f32>, RerankError> {
        if query.is_empty() {
            return Err(RerankError::InvalidInput("Query cannot be empty".to_string()));
        }
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let documents: Vec<&str> = passages.iter().map(|s| s.as_str()).collect();

        let results = self
            .model
            .rerank(query, documents, false, None)
            .map_err(|e| RerankError::ScoringError(e.to_string()))?;

        // back into input order
        let mut scores = vec![0.0f32; passages.len()];
        for result in results {
            if let Some(slot) = scores.get_mut(result.index) {
                *slot = result.score;
            }
        }

        Ok(scores)
    }
}

/// Reorders fused candidates by external relevance scores
///
/// Without a configured scorer the adapter degrades to identity ordering
/// with a uniform score; that is a degraded-but-correct mode, never a
/// failure.
pub struct RerankerAdapter {
    scorer: Option<Arc<dyn RelevanceScorer>>,
}

impl RerankerAdapter {
    pub fn new(scorer: Option<Arc<dyn RelevanceScorer>>) -> Self {
        Self { scorer }
    }

    pub fn without_scorer() -> Self {
        Self { scorer: None }
    }

    /// Build the adapter the configuration asks for
    ///
    /// Reranking disabled yields the scorerless fallback adapter; enabled
    /// loads the configured cross-encoder model.
    pub fn from_config(config: &RetrievalConfig) -> Result<Self, RerankError> {
        if !config.enable_reranking {
            return Ok(Self::without_scorer());
        }

        let scorer = FastEmbedScorer::new(&config.reranker_model)?;
        Ok(Self::new(Some(Arc::new(scorer))))
    }

    /// Rerank candidates against the query and truncate to `limit`
    pub fn rerank(
        &self,
        query: &str,
        candidates: Vec<EmbeddingRecord>,
        limit: usize,
    ) -> Result<Vec<(EmbeddingRecord, f32)>, RerankError> {
        let scorer = match &self.scorer {
            Some(scorer) => scorer,
            None => {
                warn!("No reranking model configured; keeping fused order");
                return Ok(candidates
                    .into_iter()
                    .take(limit)
                    .map(|record| (record, 1.0))
                    .collect());
            }
        };

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = candidates.iter().map(|c| c.chunk.clone()).collect();
        let scores = scorer.score_pairs(query, &texts)?;

        if scores.len() != candidates.len() {
            return Err(RerankError::ScoringError(format!(
                "Score count mismatch: expected {}, got {}",
                candidates.len(),
                scores.len()
            )));
        }

        let mut scored: Vec<(EmbeddingRecord, f32)> =
            candidates.into_iter().zip(scores).collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored)
    }
}
