//! Document chunk and ingestion types

use serde::{Deserialize, Serialize};

/// A bounded span of extracted document text with its source metadata.
///
/// `start` and `end` are character offsets into the extracted text of
/// `page` (zero-based). Chunks are created during ingestion and never
/// mutated afterwards; the index is rebuilt instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub file_path: String,
    pub page: usize,
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    /// Page number as shown to users (one-based)
    pub fn display_page(&self) -> usize {
        self.page + 1
    }

    /// Whether the chunk points at a PDF that can be previewed
    pub fn is_pdf(&self) -> bool {
        self.file_path.to_lowercase().ends_with(".pdf")
    }
}

/// Extracted text of one page of a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page: usize,
    pub text: String,
}

/// Configuration for document chunking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Number of chunks sent to the embedder per request
    pub batch_size: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            batch_size: 32,
        }
    }
}

/// A file the processor could not ingest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Result of an ingestion run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestionReport {
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub chunks: usize,
    pub skipped: Vec<SkippedFile>,
}

impl IngestionReport {
    /// Record a file that was skipped
    pub fn skip(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.files_skipped += 1;
        self.skipped.push(SkippedFile {
            path: path.into(),
            reason: reason.into(),
        });
    }
}
