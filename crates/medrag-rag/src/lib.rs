//! Retrieval pipeline for MedRAG
//!
//! Text extraction, chunking, embedding, the persisted similarity index and
//! the query engine that ties retrieval to the backend selector.

pub mod chunking;
pub mod config;
pub mod embedder;
pub mod engine;
pub mod extract;
pub mod index;
pub mod processor;
pub mod retriever;

#[cfg(test)]
mod tests;

pub use chunking::chunk_page;
pub use config::AppConfig;
pub use embedder::{build_embedder, EmbeddingConfig, EmbeddingProvider, HashEmbedder, OllamaEmbedder};
pub use engine::{build_context, QueryEngine};
pub use extract::{extract_pages, is_supported, SourceKind};
pub use index::{FlatIndex, IndexEntry, INDEX_FILE};
pub use processor::{resolve_document, sanitize_file_name, DocumentProcessor};
pub use retriever::Retriever;

// Re-export core types for convenience
pub use medrag_core::{
    Chunk, Error, IndexStats, IndexingConfig, IngestionReport, QueryOutcome, RagQuery, Result,
    ScoredChunk, SimilarityIndex,
};
