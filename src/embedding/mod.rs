//! Dual embedding generation and ingestion
//!
//! Architecture:
//! - EmbeddingProvider trait abstracting over dense + sparse model backends
//! - FastEmbedProvider for local generation (BGE dense, SPLADE++ sparse)
//! - SparseVector codec for bounded, deterministically ordered sparse vectors
//! - EmbeddingPipeline driving split -> embed -> store for one document

mod pipeline;
mod provider;
mod sparse;

pub use pipeline::EmbeddingPipeline;
pub use provider::{DualEmbedding, EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use sparse::SparseVector;
