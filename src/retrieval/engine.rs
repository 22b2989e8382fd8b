//! Hybrid retrieval: per-space nearest-neighbor queries fused with RRF

use crate::config::{EmbeddingConfig, RetrievalConfig};
use crate::embedding::{EmbeddingProvider, SparseVector};
use crate::retrieval::fusion::reciprocal_rank_fusion;
use crate::store::{EmbeddingRecord, EmbeddingStore, EmbeddingsCollection, QueryVector};
use ahash::AHashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Embedding generation failed: {0}")]
    EmbeddingError(String),

    #[error("Store query failed: {0}")]
    StoreError(String),

    #[error("Reranking failed: {0}")]
    RerankingError(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Fuses dense and sparse nearest-neighbor results across collections
///
/// Read-only and stateless between calls; safe for unbounded concurrent
/// queries.
pub struct RetrievalEngine {
    store: Arc<EmbeddingStore>,
    provider: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
    sparse_max_dim: u32,
}

impl RetrievalEngine {
    pub fn new(
        store: Arc<EmbeddingStore>,
        provider: Arc<dyn EmbeddingProvider>,
        retrieval_config: RetrievalConfig,
        embedding_config: &EmbeddingConfig,
    ) -> Self {
        Self {
            store,
            provider,
            config: retrieval_config,
            sparse_max_dim: embedding_config.sparse_max_dim,
        }
    }

    /// Hybrid search over the named collections
    ///
    /// Both candidate lists are fetched `search_multiplier` times wider than
    /// the requested limit: RRF order on a narrow candidate set is unstable,
    /// so fusion runs over the widened pool before the final cut. The
    /// returned list is truncated to `limit`, or kept widened when a
    /// reranker will make the final cut.
    pub fn search(
        &self,
        collection_names: &[String],
        query_text: &str,
        limit: usize,
        want_rerank: bool,
    ) -> Result<Vec<(EmbeddingRecord, f32)>, SearchError> {
        if query_text.is_empty() {
            return Err(SearchError::InvalidQuery(
                "Query text cannot be empty".to_string(),
            ));
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let collections = self.resolve_collections(collection_names)?;
        if collections.is_empty() {
            debug!(?collection_names, "No collections resolved for search");
            return Ok(Vec::new());
        }

        let query_embedding = self
            .provider
            .embed_query(query_text)
            .map_err(|e| SearchError::EmbeddingError(e.to_string()))?;

        let dense_query = QueryVector::Dense(query_embedding.dense);
        let sparse_query = QueryVector::Sparse(SparseVector::encode(
            &query_embedding.sparse,
            self.sparse_max_dim,
        ));

        let window = limit * self.config.search_multiplier;

        let mut dense_hits: Vec<(EmbeddingRecord, f32)> = Vec::new();
        let mut sparse_hits: Vec<(EmbeddingRecord, f32)> = Vec::new();
        for collection in &collections {
            dense_hits.extend(
                self.store
                    .nearest(collection.id, &dense_query, window)
                    .map_err(|e| SearchError::StoreError(e.to_string()))?,
            );
            sparse_hits.extend(
                self.store
                    .nearest(collection.id, &sparse_query, window)
                    .map_err(|e| SearchError::StoreError(e.to_string()))?,
            );
        }

        // per-space lists from different collections merge by raw similarity
        // before ranks are assigned
        dense_hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        sparse_hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let dense_ranked: Vec<(Uuid, f32)> =
            dense_hits.iter().map(|(r, score)| (r.id, *score)).collect();
        let sparse_ranked: Vec<(Uuid, f32)> =
            sparse_hits.iter().map(|(r, score)| (r.id, *score)).collect();

        let mut records: AHashMap<Uuid, EmbeddingRecord> = AHashMap::new();
        for (record, _) in dense_hits.into_iter().chain(sparse_hits) {
            records.entry(record.id).or_insert(record);
        }

        let fused = reciprocal_rank_fusion(&dense_ranked, &sparse_ranked, self.config.rrf_k);

        let keep = if want_rerank {
            limit * self.config.search_multiplier
        } else {
            limit
        };

        Ok(fused
            .into_iter()
            .filter_map(|(id, score)| records.remove(&id).map(|record| (record, score)))
            .take(keep)
            .collect())
    }

    /// Resolve collection names to their most recent versions
    ///
    /// A name with no matching collection contributes nothing.
    fn resolve_collections(
        &self,
        names: &[String],
    ) -> Result<Vec<EmbeddingsCollection>, SearchError> {
        let mut collections = Vec::with_capacity(names.len());
        for name in names {
            match self
                .store
                .most_recent_by_name(name)
                .map_err(|e| SearchError::StoreError(e.to_string()))?
            {
                Some(collection) => collections.push(collection),
                None => debug!(name, "Collection name did not resolve; skipping"),
            }
        }
        Ok(collections)
    }
}
