//! Core traits and types for MedRAG
//!
//! This crate defines the fundamental traits and types used across the MedRAG system.
//! It provides capability-facing interfaces for answer backends, embedders and the
//! similarity index, making the pipeline test-friendly and extensible.

pub mod document;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod rag;
pub mod vector_store;

#[cfg(test)]
mod tests;

pub use document::{Chunk, IndexingConfig, IngestionReport, PageText, SkippedFile};
pub use embedding::Embedder;
pub use error::{Error, Result};
pub use llm::{AnswerBackend, Answer, GenerationConfig, Prompt, FALLBACK_LABEL};
pub use rag::{QueryOutcome, RagQuery};
pub use vector_store::{IndexStats, ScoredChunk, SimilarityIndex};
