//! Top-K retrieval over the similarity index

use std::sync::Arc;
use tracing::debug;

use medrag_core::{Embedder, Result, ScoredChunk, SimilarityIndex};

/// Embeds questions and looks them up in an index
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Return the `top_k` chunks most similar to `question`
    pub async fn retrieve(
        &self,
        index: &dyn SimilarityIndex,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if index.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed_query(question).await?;
        let results = index.search(&query, top_k)?;
        debug!(top_k, hits = results.len(), "Retrieved chunks");
        Ok(results)
    }
}
