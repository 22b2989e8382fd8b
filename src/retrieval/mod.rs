//! Hybrid retrieval and reranking
//!
//! Dense and sparse nearest-neighbor queries are fused with Reciprocal Rank
//! Fusion, optionally reranked by a cross-encoder, and shaped into search
//! results.

mod engine;
mod fusion;
mod orchestrator;
mod reranker;

pub use engine::{RetrievalEngine, SearchError};
pub use fusion::{reciprocal_rank_fusion, RRF_K};
pub use orchestrator::{SearchResult, SearchService};
pub use reranker::{FastEmbedScorer, RelevanceScorer, RerankError, RerankerAdapter};
