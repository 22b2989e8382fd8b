//! Store integration tests against real SQLite files

use quarry::embedding::SparseVector;
use quarry::splitter::Metadata;
use quarry::store::{EmbeddingRecord, EmbeddingStore, QueryVector};
use std::collections::HashMap;
use tempfile::TempDir;
use uuid::Uuid;

fn open_store(dir: &TempDir) -> EmbeddingStore {
    EmbeddingStore::new(&dir.path().join("embeddings.db")).unwrap()
}

fn record(collection_id: Uuid, chunk: &str, dense: Vec<f32>, sparse: &[(u32, f32)]) -> EmbeddingRecord {
    let weights: HashMap<u32, f32> = sparse.iter().copied().collect();
    EmbeddingRecord::new(
        collection_id,
        Uuid::new_v4(),
        Uuid::new_v4(),
        chunk.to_string(),
        dense,
        SparseVector::encode(&weights, 1000),
        Metadata::new(),
    )
}

#[test]
fn test_create_and_list_collections() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let created = store.create_collection("docs", "v1", "first run").unwrap();
    store.create_collection("other", "v1", "").unwrap();

    let all = store.all_collections().unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|c| c.id == created.id));
}

#[test]
fn test_most_recent_by_name_prefers_newest() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store.create_collection("docs", "v1", "").unwrap();
    let newer = store.create_collection("docs", "v2", "").unwrap();

    let resolved = store.most_recent_by_name("docs").unwrap().unwrap();
    assert_eq!(resolved.id, newer.id);
    assert_eq!(resolved.version, "v2");
}

#[test]
fn test_most_recent_by_name_missing_is_none() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    assert!(store.most_recent_by_name("nope").unwrap().is_none());
}

#[test]
fn test_put_and_get_by_document_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let collection = store.create_collection("docs", "v1", "").unwrap();

    let mut metadata = Metadata::new();
    metadata.insert("page".to_string(), serde_json::json!(3));
    let mut rec = record(collection.id, "chunk body", vec![0.1, 0.2, 0.3], &[(5, 0.7)]);
    rec.chunk_metadata = metadata;

    store.put(std::slice::from_ref(&rec)).unwrap();

    let fetched = store.get_by_document(rec.document_id).unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].id, rec.id);
    assert_eq!(fetched[0].chunk, "chunk body");
    assert_eq!(fetched[0].embedding, vec![0.1, 0.2, 0.3]);
    assert_eq!(fetched[0].sparse_embedding, rec.sparse_embedding);
    assert_eq!(fetched[0].chunk_metadata["page"], serde_json::json!(3));
}

#[test]
fn test_put_empty_batch_is_noop() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    store.put(&[]).unwrap();
}

#[test]
fn test_nearest_dense_orders_by_similarity() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let collection = store.create_collection("docs", "v1", "").unwrap();

    let aligned = record(collection.id, "aligned", vec![1.0, 0.0, 0.0], &[]);
    let diagonal = record(collection.id, "diagonal", vec![1.0, 1.0, 0.0], &[]);
    let orthogonal = record(collection.id, "orthogonal", vec![0.0, 0.0, 1.0], &[]);
    store
        .put(&[aligned.clone(), diagonal.clone(), orthogonal.clone()])
        .unwrap();

    let query = QueryVector::Dense(vec![1.0, 0.0, 0.0]);
    let hits = store.nearest(collection.id, &query, 10).unwrap();

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].0.chunk, "aligned");
    assert!((hits[0].1 - 1.0).abs() < 1e-6);
    assert_eq!(hits[1].0.chunk, "diagonal");
    assert_eq!(hits[2].0.chunk, "orthogonal");
    assert!(hits[0].1 >= hits[1].1 && hits[1].1 >= hits[2].1);
}

#[test]
fn test_nearest_sparse_orders_by_overlap() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let collection = store.create_collection("docs", "v1", "").unwrap();

    let overlapping = record(collection.id, "overlapping", vec![0.0], &[(1, 1.0), (2, 1.0)]);
    let disjoint = record(collection.id, "disjoint", vec![0.0], &[(9, 1.0)]);
    store.put(&[overlapping, disjoint]).unwrap();

    let weights: HashMap<u32, f32> = [(1u32, 1.0f32)].into_iter().collect();
    let query = QueryVector::Sparse(SparseVector::encode(&weights, 1000));
    let hits = store.nearest(collection.id, &query, 10).unwrap();

    assert_eq!(hits[0].0.chunk, "overlapping");
    assert!(hits[0].1 > hits[1].1);
    assert_eq!(hits[1].1, 0.0);
}

#[test]
fn test_nearest_truncates_to_limit() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let collection = store.create_collection("docs", "v1", "").unwrap();

    let records: Vec<EmbeddingRecord> = (0..5)
        .map(|i| record(collection.id, &format!("chunk {}", i), vec![i as f32, 1.0], &[]))
        .collect();
    store.put(&records).unwrap();

    let query = QueryVector::Dense(vec![1.0, 1.0]);
    let hits = store.nearest(collection.id, &query, 2).unwrap();
    assert_eq!(hits.len(), 2);
}

#[test]
fn test_nearest_zero_limit_and_empty_collection() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let collection = store.create_collection("docs", "v1", "").unwrap();
    let query = QueryVector::Dense(vec![1.0]);

    assert!(store.nearest(collection.id, &query, 0).unwrap().is_empty());
    assert!(store.nearest(collection.id, &query, 5).unwrap().is_empty());
}

#[test]
fn test_collections_isolate_records() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let first = store.create_collection("first", "v1", "").unwrap();
    let second = store.create_collection("second", "v1", "").unwrap();

    store
        .put(&[record(first.id, "only in first", vec![1.0], &[])])
        .unwrap();

    let query = QueryVector::Dense(vec![1.0]);
    assert_eq!(store.nearest(first.id, &query, 10).unwrap().len(), 1);
    assert!(store.nearest(second.id, &query, 10).unwrap().is_empty());
}

#[test]
fn test_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("embeddings.db");
    let collection_id;
    {
        let store = EmbeddingStore::new(&path).unwrap();
        let collection = store.create_collection("docs", "v1", "").unwrap();
        collection_id = collection.id;
        store
            .put(&[record(collection.id, "persisted", vec![0.5, 0.5], &[])])
            .unwrap();
    }

    let reopened = EmbeddingStore::new(&path).unwrap();
    let resolved = reopened.most_recent_by_name("docs").unwrap().unwrap();
    assert_eq!(resolved.id, collection_id);

    let query = QueryVector::Dense(vec![0.5, 0.5]);
    let hits = reopened.nearest(collection_id, &query, 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0.chunk, "persisted");
}
