//! Quarry - page-aware document splitting and hybrid retrieval
//!
//! A library core that turns long structured documents into retrieval-sized
//! passages with page and header provenance, stores dual (dense + sparse)
//! embeddings per passage, and answers queries by fusing nearest-neighbor
//! results from both vector spaces with optional reranking on top.

pub mod config;
pub mod embedding;
pub mod error;
pub mod logging;
pub mod retrieval;
pub mod splitter;
pub mod store;

pub use error::{Error, Result};
