//! Persistent store for dual chunk embeddings
//!
//! Records are append-only: re-embedding a document creates new records in a
//! new collection rather than mutating existing ones. Nearest-neighbor
//! queries run an exact cosine scan per collection; index maintenance beyond
//! that is an external concern.

mod database;

pub use database::{Database, DbPool};

use crate::embedding::SparseVector;
use crate::splitter::Metadata;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::params;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Store cannot be reached; callers may retry the whole operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Stored value malformed: {0}")]
    Malformed(String),
}

/// A named, versioned namespace of embedding records
///
/// Multiple collections may share a name; queries address "the most recent
/// by name".
#[derive(Debug, Clone)]
pub struct EmbeddingsCollection {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// One persisted chunk embedding: dense + sparse vectors plus provenance
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    pub id: Uuid,
    pub collection_id: Uuid,
    pub document_id: Uuid,
    pub page_id: Uuid,
    pub chunk: String,
    pub embedding: Vec<f32>,
    pub sparse_embedding: SparseVector,
    pub chunk_metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl EmbeddingRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        collection_id: Uuid,
        document_id: Uuid,
        page_id: Uuid,
        chunk: String,
        embedding: Vec<f32>,
        sparse_embedding: SparseVector,
        chunk_metadata: Metadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            collection_id,
            document_id,
            page_id,
            chunk,
            embedding,
            sparse_embedding,
            chunk_metadata,
            created_at: Utc::now(),
        }
    }
}

/// Query vector for one of the two spaces
#[derive(Debug, Clone)]
pub enum QueryVector {
    Dense(Vec<f32>),
    Sparse(SparseVector),
}

/// SQLite-backed embedding store
pub struct EmbeddingStore {
    db: Database,
}

impl EmbeddingStore {
    pub fn new(db_path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            db: Database::new(db_path)?,
        })
    }

    /// Create and persist a new collection
    pub fn create_collection(
        &self,
        name: &str,
        version: &str,
        description: &str,
    ) -> Result<EmbeddingsCollection, StoreError> {
        let collection = EmbeddingsCollection {
            id: Uuid::new_v4(),
            name: name.to_string(),
            version: version.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        };

        let conn = self.db.get_conn()?;
        conn.execute(
            "INSERT INTO collections (id, name, version, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                collection.id.to_string(),
                collection.name,
                collection.version,
                collection.description,
                collection.created_at.timestamp_millis(),
            ],
        )?;

        Ok(collection)
    }

    /// Most recently created collection with the given name, if any
    pub fn most_recent_by_name(&self, name: &str) -> Result<Option<EmbeddingsCollection>, StoreError> {
        let conn = self.db.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, version, description, created_at FROM collections
             WHERE name = ?1 ORDER BY created_at DESC, rowid DESC LIMIT 1",
        )?;

        let mut rows = stmt.query(params![name])?;
        match rows.next()? {
            Some(row) => Ok(Some(Self::collection_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// All collections, newest first
    pub fn all_collections(&self) -> Result<Vec<EmbeddingsCollection>, StoreError> {
        let conn = self.db.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, version, description, created_at FROM collections
             ORDER BY created_at DESC, rowid DESC",
        )?;

        let mut collections = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            collections.push(Self::collection_from_row(row)?);
        }

        Ok(collections)
    }

    /// Append a batch of records in one transaction
    ///
    /// A failed batch leaves the store untouched and is retried as a whole
    /// unit by the caller; the store does not deduplicate.
    pub fn put(&self, records: &[EmbeddingRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut conn = self.db.get_conn()?;
        let tx = conn.transaction()?;

        for record in records {
            let sparse_json = serde_json::to_string(&record.sparse_embedding)
                .map_err(|e| StoreError::Malformed(format!("sparse vector: {}", e)))?;
            let metadata_json = serde_json::to_string(&record.chunk_metadata)
                .map_err(|e| StoreError::Malformed(format!("chunk metadata: {}", e)))?;

            tx.execute(
                "INSERT INTO embeddings
                 (id, collection_id, document_id, page_id, chunk, embedding,
                  sparse_embedding, chunk_metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id.to_string(),
                    record.collection_id.to_string(),
                    record.document_id.to_string(),
                    record.page_id.to_string(),
                    record.chunk,
                    encode_dense(&record.embedding),
                    sparse_json,
                    metadata_json,
                    record.created_at.timestamp_millis(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// All records belonging to a document, oldest first
    pub fn get_by_document(&self, document_id: Uuid) -> Result<Vec<EmbeddingRecord>, StoreError> {
        let conn = self.db.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, collection_id, document_id, page_id, chunk, embedding,
                    sparse_embedding, chunk_metadata, created_at
             FROM embeddings WHERE document_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )?;

        let mut records = Vec::new();
        let mut rows = stmt.query(params![document_id.to_string()])?;
        while let Some(row) = rows.next()? {
            records.push(Self::record_from_row(row)?);
        }

        Ok(records)
    }

    /// Nearest neighbors in one collection and one vector space
    ///
    /// Score is `1 - cosine_distance` (higher is more similar); results are
    /// ordered by ascending distance and truncated to `limit`. A zero limit
    /// or an empty collection yields an empty list, never an error.
    pub fn nearest(
        &self,
        collection_id: Uuid,
        query: &QueryVector,
        limit: usize,
    ) -> Result<Vec<(EmbeddingRecord, f32)>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let conn = self.db.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, collection_id, document_id, page_id, chunk, embedding,
                    sparse_embedding, chunk_metadata, created_at
             FROM embeddings WHERE collection_id = ?1",
        )?;

        let mut scored = Vec::new();
        let mut rows = stmt.query(params![collection_id.to_string()])?;
        while let Some(row) = rows.next()? {
            let record = Self::record_from_row(row)?;
            let score = match query {
                QueryVector::Dense(vector) => dense_cosine_similarity(vector, &record.embedding),
                QueryVector::Sparse(vector) => vector.cosine_similarity(&record.sparse_embedding),
            };
            scored.push((record, score));
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored)
    }

    fn collection_from_row(row: &rusqlite::Row<'_>) -> Result<EmbeddingsCollection, StoreError> {
        let id: String = row.get(0)?;
        let created_at: i64 = row.get(4)?;

        Ok(EmbeddingsCollection {
            id: parse_uuid(&id)?,
            name: row.get(1)?,
            version: row.get(2)?,
            description: row.get(3)?,
            created_at: parse_timestamp(created_at)?,
        })
    }

    fn record_from_row(row: &rusqlite::Row<'_>) -> Result<EmbeddingRecord, StoreError> {
        let id: String = row.get(0)?;
        let collection_id: String = row.get(1)?;
        let document_id: String = row.get(2)?;
        let page_id: String = row.get(3)?;
        let embedding_blob: Vec<u8> = row.get(5)?;
        let sparse_json: String = row.get(6)?;
        let metadata_json: String = row.get(7)?;
        let created_at: i64 = row.get(8)?;

        Ok(EmbeddingRecord {
            id: parse_uuid(&id)?,
            collection_id: parse_uuid(&collection_id)?,
            document_id: parse_uuid(&document_id)?,
            page_id: parse_uuid(&page_id)?,
            chunk: row.get(4)?,
            embedding: decode_dense(&embedding_blob)?,
            sparse_embedding: serde_json::from_str(&sparse_json)
                .map_err(|e| StoreError::Malformed(format!("sparse vector: {}", e)))?,
            chunk_metadata: serde_json::from_str(&metadata_json)
                .map_err(|e| StoreError::Malformed(format!("chunk metadata: {}", e)))?,
            created_at: parse_timestamp(created_at)?,
        })
    }
}

fn parse_uuid(value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|e| StoreError::Malformed(format!("uuid {}: {}", value, e)))
}

fn parse_timestamp(millis: i64) -> Result<DateTime<Utc>, StoreError> {
    match Utc.timestamp_millis_opt(millis) {
        chrono::LocalResult::Single(dt) => Ok(dt),
        _ => Err(StoreError::Malformed(format!("timestamp {}", millis))),
    }
}

/// Dense vectors are stored as little-endian f32 blobs
fn encode_dense(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn decode_dense(bytes: &[u8]) -> Result<Vec<f32>, StoreError> {
    if bytes.len() % 4 != 0 {
        return Err(StoreError::Malformed(format!(
            "dense vector blob of {} bytes",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Cosine similarity over dense vectors; zero-magnitude operands yield 0.0
pub fn dense_cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
