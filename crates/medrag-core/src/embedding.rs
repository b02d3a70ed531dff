//! Embedder trait

use async_trait::async_trait;

use crate::Result;

/// Trait for embedding models (e.g., a local Ollama daemon)
///
/// The model itself is external; implementations only ship text over and
/// bring fixed-length vectors back.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query string
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::Error::Embedding("embedder returned no vector".to_string()))
    }

    /// Name of the embedding model
    fn model_name(&self) -> &str;
}
