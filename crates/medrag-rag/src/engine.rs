//! Query engine: retrieval, answering and index rebuilds

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use medrag_core::{
    Embedder, Error, IndexStats, IngestionReport, Prompt, QueryOutcome, RagQuery, Result,
    ScoredChunk, SimilarityIndex,
};
use medrag_llm::{BackendSelector, SelectorStatus};

use crate::config::AppConfig;
use crate::embedder::build_embedder;
use crate::index::FlatIndex;
use crate::processor::{resolve_document, DocumentProcessor};
use crate::retriever::Retriever;

/// Format retrieved chunks as the context block sent to a backend
pub fn build_context(sources: &[ScoredChunk]) -> String {
    sources
        .iter()
        .map(|s| {
            format!(
                "[Source: {} - Page {}]\n{}",
                s.chunk.source,
                s.chunk.display_page(),
                s.chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The whole pipeline behind one handle.
///
/// Queries share the index through a read lock. Rebuilds run one at a time
/// and only take the write lock to swap the finished index in.
pub struct QueryEngine {
    config: AppConfig,
    processor: DocumentProcessor,
    retriever: Retriever,
    selector: BackendSelector,
    index: RwLock<FlatIndex>,
    rebuild_lock: Mutex<()>,
}

impl QueryEngine {
    /// Build the engine from configuration, loading any saved index
    pub fn open(config: AppConfig) -> Result<Self> {
        let embedder = build_embedder(&config.embedding)?;
        let selector = BackendSelector::from_config(&config.backends)?;
        Self::with_parts(config, embedder, selector)
    }

    pub fn with_parts(
        config: AppConfig,
        embedder: Arc<dyn Embedder>,
        selector: BackendSelector,
    ) -> Result<Self> {
        let index = match FlatIndex::load_or_empty(&config.index_dir, embedder.model_name()) {
            Ok(index) => index,
            Err(e) => {
                warn!(
                    dir = %config.index_dir.display(),
                    error = %e,
                    "Saved index could not be loaded; starting with an empty knowledge base"
                );
                FlatIndex::new(embedder.model_name())
            }
        };
        if !index.is_empty() && index.embedding_model() != embedder.model_name() {
            warn!(
                index_model = index.embedding_model(),
                embedder = embedder.model_name(),
                "Saved index was built with a different embedding model; re-run ingestion"
            );
        }
        info!(
            chunks = index.len(),
            backends = selector.len(),
            "Query engine ready"
        );

        Ok(Self {
            processor: DocumentProcessor::new(embedder.clone(), config.indexing.clone()),
            retriever: Retriever::new(embedder),
            selector,
            index: RwLock::new(index),
            rebuild_lock: Mutex::new(()),
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Retrieve the chunks most relevant to `question`
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<ScoredChunk>> {
        let index = self.index.read().await;
        if index.is_empty() {
            return Err(Error::Index(
                "knowledge base is empty; run ingestion first".to_string(),
            ));
        }
        self.retriever.retrieve(&*index, question, top_k).await
    }

    /// Answer a question from the knowledge base
    pub async fn ask(&self, query: &RagQuery) -> Result<QueryOutcome> {
        let question = query.question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("question must not be empty".to_string()));
        }

        let started = Instant::now();
        let sources = self.retrieve(question, query.top_k).await?;
        let retrieval_ms = started.elapsed().as_millis() as u64;

        let context = build_context(&sources);
        let prompt = Prompt {
            question: question.to_string(),
            context: context.clone(),
            excerpts: sources.iter().map(|s| s.chunk.text.clone()).collect(),
        };

        let started = Instant::now();
        let answer = self.selector.answer(&prompt).await;
        let generation_ms = started.elapsed().as_millis() as u64;

        info!(
            backend = %answer.backend,
            sources = sources.len(),
            retrieval_ms,
            generation_ms,
            "Answered question"
        );

        Ok(QueryOutcome {
            question: question.to_string(),
            answer,
            sources,
            context,
            retrieval_ms,
            generation_ms,
        })
    }

    /// Rebuild the index from the documents directory and persist it
    pub async fn rebuild(&self) -> Result<IngestionReport> {
        let _guard = self.rebuild_lock.lock().await;
        let (index, report) = self
            .processor
            .ingest(&self.config.docs_dir, &self.config.index_dir)
            .await?;
        *self.index.write().await = index;
        Ok(report)
    }

    /// Store an uploaded file and rebuild the index
    pub async fn upload(&self, name: &str, bytes: &[u8]) -> Result<(PathBuf, IngestionReport)> {
        let path = {
            let _guard = self.rebuild_lock.lock().await;
            DocumentProcessor::store_upload(&self.config.docs_dir, name, bytes)?
        };
        let report = self.rebuild().await?;
        Ok((path, report))
    }

    /// Path of a stored source document, for previews.
    ///
    /// `None` when no such document exists.
    pub fn document_path(&self, name: &str) -> Result<Option<PathBuf>> {
        let path = resolve_document(&self.config.docs_dir, name)?;
        Ok(path.is_file().then_some(path))
    }

    pub async fn stats(&self) -> IndexStats {
        self.index.read().await.stats()
    }

    pub fn backend_status(&self) -> SelectorStatus {
        self.selector.status()
    }
}
