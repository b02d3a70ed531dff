//! Flat in-memory similarity index persisted as JSON

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use medrag_core::{Chunk, Error, IndexStats, Result, ScoredChunk, SimilarityIndex};

/// File name of the persisted index inside the index directory
pub const INDEX_FILE: &str = "index.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// Exhaustive cosine-similarity index over chunk embeddings.
///
/// Entries keep insertion order, which is also the tie-break order for
/// equal scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    embedding_model: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl FlatIndex {
    pub fn new(embedding_model: impl Into<String>) -> Self {
        Self {
            embedding_model: embedding_model.into(),
            dimension: 0,
            entries: Vec::new(),
        }
    }

    /// Append a chunk and its embedding.
    ///
    /// The first entry fixes the dimension of the index.
    pub fn push(&mut self, chunk: Chunk, embedding: Vec<f32>) -> Result<()> {
        if chunk.text.trim().is_empty() {
            return Err(Error::Index(format!("chunk {} has no text", chunk.id)));
        }
        if embedding.is_empty() {
            return Err(Error::Index(format!("chunk {} has an empty embedding", chunk.id)));
        }
        if self.entries.is_empty() {
            self.dimension = embedding.len();
        } else if embedding.len() != self.dimension {
            return Err(Error::Index(format!(
                "embedding dimension {} does not match index dimension {}",
                embedding.len(),
                self.dimension
            )));
        }
        self.entries.push(IndexEntry { chunk, embedding });
        Ok(())
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(INDEX_FILE)
    }

    /// Write the index to `<dir>/index.json`, replacing any previous file
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let path = Self::path_in(dir);
        let tmp = dir.join(format!("{}.tmp", INDEX_FILE));

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;

        info!(path = %path.display(), chunks = self.entries.len(), "Saved index");
        Ok(())
    }

    /// Load a previously saved index
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::path_in(dir);
        let content = fs::read_to_string(&path)?;
        let index: FlatIndex = serde_json::from_str(&content)
            .map_err(|e| Error::Index(format!("corrupt index {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), chunks = index.entries.len(), "Loaded index");
        Ok(index)
    }

    /// Load the saved index, or start empty when none exists yet
    pub fn load_or_empty(dir: &Path, embedding_model: &str) -> Result<Self> {
        if Self::path_in(dir).exists() {
            Self::load(dir)
        } else {
            Ok(Self::new(embedding_model))
        }
    }
}

impl SimilarityIndex for FlatIndex {
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        if self.entries.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(Error::Index(format!(
                "query dimension {} does not match index dimension {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query, &entry.embedding), entry))
            .collect();

        // Stable sort: equal scores stay in insertion order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, entry)| ScoredChunk {
                chunk: entry.chunk.clone(),
                score,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn stats(&self) -> IndexStats {
        IndexStats {
            loaded: !self.entries.is_empty(),
            total_chunks: self.entries.len(),
            dimension: self.dimension,
            embedding_model: self.embedding_model.clone(),
        }
    }
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
