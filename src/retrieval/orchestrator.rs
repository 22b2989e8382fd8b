//! Top-level search entry point

use crate::config::RetrievalConfig;
use crate::retrieval::{RerankerAdapter, RetrievalEngine, SearchError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One search hit, shaped for consumers
///
/// Ephemeral: constructed per query, never persisted. The internal record
/// identity is dropped in favor of the document, page, and chunk references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Matching chunk text
    pub text: String,

    /// Sequential chunk id from the split that produced the record
    pub chunk_id: Option<u64>,

    /// Source document
    pub document_id: Uuid,

    /// Source page
    pub page_id: Uuid,

    /// Fused or reranked score, higher is better
    pub score: f32,
}

/// Drives fusion, optional reranking, and result shaping for one query
pub struct SearchService {
    engine: RetrievalEngine,
    reranker: RerankerAdapter,
    default_limit: usize,
    default_collection: String,
}

impl SearchService {
    pub fn new(engine: RetrievalEngine, reranker: RerankerAdapter, config: &RetrievalConfig) -> Self {
        Self {
            engine,
            reranker,
            default_limit: config.default_limit.max(1),
            default_collection: config.default_collection.clone(),
        }
    }

    /// Find the texts best matching the query
    ///
    /// A non-positive limit is coerced to the configured default; an absent
    /// collection list targets the default collection. When reranking is
    /// requested the fusion stage runs with a widened limit so the reranker
    /// has enough candidates to reorder.
    pub fn find_matching_texts(
        &self,
        query: &str,
        limit: usize,
        use_reranker: bool,
        collection_names: Option<&[String]>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let limit = if limit < 1 { self.default_limit } else { limit };

        let default_names = [self.default_collection.clone()];
        let names: &[String] = collection_names.unwrap_or(&default_names);

        let fused = self.engine.search(names, query, limit, use_reranker)?;

        let scored = if use_reranker {
            let candidates = fused.into_iter().map(|(record, _)| record).collect();
            self.reranker
                .rerank(query, candidates, limit)
                .map_err(|e| SearchError::RerankingError(e.to_string()))?
        } else {
            fused
        };

        Ok(scored
            .into_iter()
            .map(|(record, score)| SearchResult {
                text: record.chunk,
                chunk_id: record
                    .chunk_metadata
                    .get("chunk_id")
                    .and_then(|v| v.as_u64()),
                document_id: record.document_id,
                page_id: record.page_id,
                score,
            })
            .collect())
    }
}
