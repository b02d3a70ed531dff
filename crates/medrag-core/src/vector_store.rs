//! Similarity index trait and types

use serde::{Deserialize, Serialize};

use crate::{Chunk, Result};

/// A retrieved chunk and its cosine similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Statistics shown next to the knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub loaded: bool,
    pub total_chunks: usize,
    pub dimension: usize,
    pub embedding_model: String,
}

/// Trait for nearest-neighbour lookups over chunk embeddings
///
/// Read-only from the retriever's perspective. Results are ordered by
/// descending score; equal scores keep insertion order.
pub trait SimilarityIndex: Send + Sync {
    /// Return at most `top_k` chunks closest to `query`
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>>;

    /// Number of indexed chunks
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Summary statistics
    fn stats(&self) -> IndexStats;
}
