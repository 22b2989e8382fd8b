//! Ingestion pipeline: pages -> chunks -> dual embeddings -> store

use crate::config::{EmbeddingConfig, SplitterConfig};
use crate::embedding::{EmbeddingError, EmbeddingProvider, SparseVector};
use crate::error::Result;
use crate::splitter::{Chunk, DocumentSplitter, Metadata, Page};
use crate::store::{EmbeddingRecord, EmbeddingStore, EmbeddingsCollection};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Drives the embedding of one document into one collection
///
/// Callers must not run two ingestions for the same (document, collection)
/// pair concurrently; the store does not deduplicate. A failure anywhere in
/// the pipeline leaves the store untouched for this document, so the whole
/// document can be retried.
pub struct EmbeddingPipeline {
    splitter: DocumentSplitter,
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<EmbeddingStore>,
    batch_size: usize,
    sparse_max_dim: u32,
}

impl EmbeddingPipeline {
    pub fn new(
        splitter_config: &SplitterConfig,
        embedding_config: &EmbeddingConfig,
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<EmbeddingStore>,
    ) -> Self {
        Self {
            splitter: DocumentSplitter::from_config(splitter_config),
            provider,
            store,
            batch_size: embedding_config.batch_size.max(1),
            sparse_max_dim: embedding_config.sparse_max_dim,
        }
    }

    /// Split, embed, and persist one document's pages
    ///
    /// Each chunk becomes one [`EmbeddingRecord`] attributed to the source
    /// page its provenance metadata names, falling back to the first page
    /// when the page number cannot be resolved.
    pub fn embed_document(
        &self,
        collection: &EmbeddingsCollection,
        document_id: Uuid,
        pages: Vec<Page>,
    ) -> Result<Vec<EmbeddingRecord>> {
        let page_ids: Vec<(u32, Uuid)> = pages.iter().map(|p| (p.page_number, p.id)).collect();
        let first_page_id = page_ids.first().map(|(_, id)| *id);

        let chunks = self.splitter.split(pages)?;
        info!(
            document = %document_id,
            collection = %collection.name,
            chunks = chunks.len(),
            "Embedding document"
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.provider.embed_passages(batch)?);
        }

        // a short batch must fail the whole document, never commit a subset
        if embeddings.len() != chunks.len() {
            return Err(EmbeddingError::GenerationError(format!(
                "Embedding count mismatch for document {}: {} chunks, {} embeddings",
                document_id,
                chunks.len(),
                embeddings.len()
            ))
            .into());
        }

        let records: Vec<EmbeddingRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                let page_id = chunk
                    .page_number()
                    .and_then(|number| {
                        page_ids
                            .iter()
                            .find(|(page_number, _)| *page_number == number)
                            .map(|(_, id)| *id)
                    })
                    .or(first_page_id)
                    .unwrap_or_else(Uuid::new_v4);

                EmbeddingRecord::new(
                    collection.id,
                    document_id,
                    page_id,
                    chunk.text.clone(),
                    embedding.dense,
                    SparseVector::encode(&embedding.sparse, self.sparse_max_dim),
                    Self::record_metadata(chunk),
                )
            })
            .collect();

        self.store.put(&records)?;
        Ok(records)
    }

    /// Compose the persisted chunk metadata: sequential id and header path
    /// on top of the page marker fields
    fn record_metadata(chunk: &Chunk) -> Metadata {
        if chunk.metadata.contains_key("chunk_id") || chunk.metadata.contains_key("headers") {
            warn!(
                chunk_id = chunk.chunk_id,
                "Page marker contains chunk_id or headers. These will be overwritten."
            );
        }

        let mut metadata = chunk.metadata.clone();
        metadata.insert("chunk_id".to_string(), serde_json::json!(chunk.chunk_id));

        let headers: serde_json::Map<String, serde_json::Value> = chunk
            .header_path
            .iter()
            .map(|(level, title)| (level.name().to_string(), serde_json::json!(title)))
            .collect();
        metadata.insert("headers".to_string(), serde_json::Value::Object(headers));

        metadata
    }
}
