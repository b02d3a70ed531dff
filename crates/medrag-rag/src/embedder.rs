//! Embedding providers

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use medrag_core::{Embedder, Error, Result};

/// Which embedder to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Sentence-transformer model served by a local Ollama daemon
    Ollama,
    /// Deterministic hashed bag-of-words, no model required
    Hash,
}

impl EmbeddingProvider {
    pub fn parse(s: &str) -> Option<EmbeddingProvider> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Some(EmbeddingProvider::Ollama),
            "hash" | "local" => Some(EmbeddingProvider::Hash),
            _ => None,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub ollama_url: String,
    pub model: String,
    /// Vector size of the hash embedder
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Ollama,
            ollama_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            dimension: HashEmbedder::DEFAULT_DIMENSION,
        }
    }
}

/// Build the embedder described by the configuration
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    Ok(match config.provider {
        EmbeddingProvider::Ollama => Arc::new(OllamaEmbedder::new(&config.ollama_url, &config.model)?),
        EmbeddingProvider::Hash => Arc::new(HashEmbedder::new(config.dimension)?),
    })
}

/// Hash-based embeddings: word and bigram features folded into a fixed
/// number of buckets, then L2-normalised.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    name: String,
}

impl HashEmbedder {
    pub const DEFAULT_DIMENSION: usize = 384;

    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::Configuration("embedding dimension must be positive".to_string()));
        }
        Ok(Self {
            dimension,
            name: format!("hash-{}", dimension),
        })
    }

    fn bucket(&self, feature: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        hasher.finish()
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let normalized = text.to_lowercase();
        let words: Vec<&str> = normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let dim = self.dimension as u64;
        let mut embedding = vec![0.0f32; self.dimension];

        // Earlier words weigh more; each word lands in three buckets
        for (pos, word) in words.iter().enumerate() {
            let hash = self.bucket(word);
            let weight = 1.0 / (pos as f32 + 1.0);
            embedding[(hash % dim) as usize] += weight;
            embedding[((hash >> 16) % dim) as usize] += weight * 0.7;
            embedding[((hash >> 32) % dim) as usize] += weight * 0.5;
        }

        for pair in words.windows(2) {
            let hash = self.bucket(&format!("{} {}", pair[0], pair[1]));
            embedding[(hash % dim) as usize] += 0.8;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in embedding.iter_mut() {
                *val /= magnitude;
            }
        }

        embedding
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// Embeddings from an Ollama daemon (`/api/embed`, falling back to the
/// legacy `/api/embeddings` endpoint)
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    client: Client,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Serialize)]
struct LegacyEmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct LegacyEmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }

    async fn post(&self, url: &str, body: &impl Serialize) -> Result<String> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Embedding(format!("POST {} failed: {} {}", url, status, text)));
        }
        Ok(text)
    }

    async fn embed_legacy(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            let body = self
                .post(&url, &LegacyEmbedRequest {
                    model: &self.model,
                    prompt: text,
                })
                .await?;
            let parsed: LegacyEmbedResponse = serde_json::from_str(&body)
                .map_err(|e| Error::Embedding(format!("invalid embeddings response: {}", e)))?;
            out.push(parsed.embedding);
        }
        Ok(out)
    }
}

/// Read the `embeddings` array out of an `/api/embed` response
pub(crate) fn parse_embeddings(body: &str) -> Result<Vec<Vec<f32>>> {
    let value: Value = serde_json::from_str(body)?;
    let rows = value
        .get("embeddings")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Embedding("No embeddings in response".to_string()))?;

    rows.iter()
        .map(|row| {
            row.as_array()
                .ok_or_else(|| Error::Embedding("Embedding is not an array".to_string()))?
                .iter()
                .map(|v| {
                    v.as_f64()
                        .map(|n| n as f32)
                        .ok_or_else(|| Error::Embedding("Embedding value is not a number".to_string()))
                })
                .collect()
        })
        .collect()
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let vectors = match self
            .post(&url, &EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .await
        {
            Ok(body) => parse_embeddings(&body)?,
            Err(e) => {
                debug!(error = %e, "/api/embed failed, trying legacy endpoint");
                self.embed_legacy(texts).await?
            }
        };

        if vectors.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_hash_embedding_is_normalized_and_deterministic() {
        let embedder = HashEmbedder::new(64).unwrap();
        let a = embedder.embed_text("Beta blockers reduce heart rate");
        let b = embedder.embed_text("Beta blockers reduce heart rate");
        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
        assert!((cosine(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hash_embedding_prefers_related_text() {
        let embedder = HashEmbedder::new(HashEmbedder::DEFAULT_DIMENSION).unwrap();
        let query = embedder.embed_text("treatment of hypertension");
        let related = embedder.embed_text("First-line treatment of hypertension is a thiazide.");
        let unrelated = embedder.embed_text("Fractures of the distal radius are common in falls.");
        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashEmbedder::new(8).unwrap();
        assert_eq!(embedder.embed_text("  "), vec![0.0; 8]);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(HashEmbedder::new(0).is_err());
    }

    #[test]
    fn test_parse_embeddings() {
        let body = r#"{"model":"all-minilm","embeddings":[[0.5,1],[0.25,-1]]}"#;
        assert_eq!(parse_embeddings(body).unwrap(), vec![vec![0.5, 1.0], vec![0.25, -1.0]]);
        assert!(parse_embeddings(r#"{"embedding":[1]}"#).is_err());
        assert!(parse_embeddings(r#"{"embeddings":[["x"]]}"#).is_err());
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(EmbeddingProvider::parse("Ollama"), Some(EmbeddingProvider::Ollama));
        assert_eq!(EmbeddingProvider::parse("hash"), Some(EmbeddingProvider::Hash));
        assert_eq!(EmbeddingProvider::parse("faiss"), None);
    }

    #[tokio::test]
    async fn test_build_hash_embedder() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::Hash,
            dimension: 16,
            ..Default::default()
        };
        let embedder = build_embedder(&config).unwrap();
        assert_eq!(embedder.model_name(), "hash-16");
        let vectors = embedder.embed(&["a".to_string(), "b".to_string()]).await.unwrap();
        assert_eq!(vectors.len(), 2);
    }
}
