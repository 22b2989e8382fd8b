//! Reciprocal Rank Fusion for combining dense and sparse result lists

use ahash::AHashMap;
use uuid::Uuid;

/// RRF K constant; dampens the weight difference between adjacent ranks
pub const RRF_K: f32 = 60.0;

#[derive(Debug, Default, Clone, Copy)]
struct FusedEntry {
    score: f32,
    dense_rank: Option<usize>,
    sparse_rank: Option<usize>,
}

/// Apply Reciprocal Rank Fusion to the dense and sparse ranked lists
///
/// Fused score of a record is `sum over lists of 1 / (k + rank + 1)` with
/// 0-based ranks; a record present in both lists accumulates both terms.
/// Results are deduplicated by record identity and sorted descending by
/// fused score, with ties broken by dense-list rank, then sparse-list rank.
pub fn reciprocal_rank_fusion(
    dense_results: &[(Uuid, f32)],
    sparse_results: &[(Uuid, f32)],
    rrf_k: f32,
) -> Vec<(Uuid, f32)> {
    let mut entries: AHashMap<Uuid, FusedEntry> = AHashMap::new();

    for (rank, (id, _original_score)) in dense_results.iter().enumerate() {
        let entry = entries.entry(*id).or_default();
        entry.score += 1.0 / (rrf_k + rank as f32 + 1.0);
        entry.dense_rank.get_or_insert(rank);
    }

    for (rank, (id, _original_score)) in sparse_results.iter().enumerate() {
        let entry = entries.entry(*id).or_default();
        entry.score += 1.0 / (rrf_k + rank as f32 + 1.0);
        entry.sparse_rank.get_or_insert(rank);
    }

    let mut fused: Vec<(Uuid, FusedEntry)> = entries.into_iter().collect();
    fused.sort_by(|a, b| {
        b.1.score
            .partial_cmp(&a.1.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let dense_a = a.1.dense_rank.unwrap_or(usize::MAX);
                let dense_b = b.1.dense_rank.unwrap_or(usize::MAX);
                dense_a.cmp(&dense_b)
            })
            .then_with(|| {
                let sparse_a = a.1.sparse_rank.unwrap_or(usize::MAX);
                let sparse_b = b.1.sparse_rank.unwrap_or(usize::MAX);
                sparse_a.cmp(&sparse_b)
            })
    });

    fused
        .into_iter()
        .map(|(id, entry)| (id, entry.score))
        .collect()
}
