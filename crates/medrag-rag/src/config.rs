//! Application configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use medrag_core::{Error, IndexingConfig, Result};
use medrag_llm::BackendConfig;

use crate::embedder::{EmbeddingConfig, EmbeddingProvider};

/// Everything the pipeline and the web UI need to start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub docs_dir: PathBuf,
    pub index_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub top_k: usize,
    pub indexing: IndexingConfig,
    pub embedding: EmbeddingConfig,
    pub backends: BackendConfig,
}

impl AppConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            docs_dir: PathBuf::from(var("MEDRAG_DOCS_DIR").unwrap_or_else(|| "data".to_string())),
            index_dir: PathBuf::from(
                var("MEDRAG_INDEX_DIR").unwrap_or_else(|| "vectorstore".to_string()),
            ),
            host: var("MEDRAG_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_var(&var, "MEDRAG_PORT")?.unwrap_or(8501),
            top_k: parse_var(&var, "MEDRAG_TOP_K")?.unwrap_or(3),
            indexing: indexing_from_lookup(&var)?,
            embedding: embedding_from_lookup(&var)?,
            backends: BackendConfig::from_lookup(&lookup)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn indexing_from_lookup(var: &impl Fn(&str) -> Option<String>) -> Result<IndexingConfig> {
    let defaults = IndexingConfig::default();
    Ok(IndexingConfig {
        chunk_size: parse_var(var, "MEDRAG_CHUNK_SIZE")?.unwrap_or(defaults.chunk_size),
        chunk_overlap: parse_var(var, "MEDRAG_CHUNK_OVERLAP")?.unwrap_or(defaults.chunk_overlap),
        batch_size: parse_var(var, "MEDRAG_EMBED_BATCH")?.unwrap_or(defaults.batch_size),
    })
}

fn embedding_from_lookup(var: &impl Fn(&str) -> Option<String>) -> Result<EmbeddingConfig> {
    let defaults = EmbeddingConfig::default();
    let provider = match var("EMBEDDING_PROVIDER") {
        Some(name) => EmbeddingProvider::parse(&name).ok_or_else(|| {
            Error::Configuration(format!("unknown EMBEDDING_PROVIDER '{}'", name))
        })?,
        None => defaults.provider,
    };

    Ok(EmbeddingConfig {
        provider,
        ollama_url: var("OLLAMA_URL").unwrap_or(defaults.ollama_url),
        model: var("OLLAMA_EMBED_MODEL").unwrap_or(defaults.model),
        dimension: parse_var(var, "EMBEDDING_DIMENSION")?.unwrap_or(defaults.dimension),
    })
}

fn parse_var<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Configuration(format!("{} must be a number, got '{}'", key, raw))),
        None => Ok(None),
    }
}
