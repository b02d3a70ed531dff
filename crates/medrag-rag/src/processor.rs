//! Document processor: walk, extract, chunk, embed, index

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use medrag_core::{Chunk, Embedder, Error, IndexingConfig, IngestionReport, Result};

use crate::chunking::chunk_page;
use crate::extract::{extract_pages, is_supported};
use crate::index::FlatIndex;

/// Builds a [`FlatIndex`] from a directory of source files
pub struct DocumentProcessor {
    embedder: Arc<dyn Embedder>,
    config: IndexingConfig,
}

impl DocumentProcessor {
    pub fn new(embedder: Arc<dyn Embedder>, config: IndexingConfig) -> Self {
        Self { embedder, config }
    }

    pub fn config(&self) -> &IndexingConfig {
        &self.config
    }

    /// Every file under `docs_dir`, in sorted path order
    fn walk_files(docs_dir: &Path) -> impl Iterator<Item = PathBuf> {
        WalkDir::new(docs_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
    }

    /// Supported files under `docs_dir`, in sorted path order
    pub fn source_files(docs_dir: &Path) -> Vec<PathBuf> {
        Self::walk_files(docs_dir)
            .filter(|path| is_supported(path))
            .collect()
    }

    /// Build a fresh index from every supported file under `docs_dir`.
    ///
    /// Unsupported, unreadable or text-less files are skipped and reported.
    /// Embedding and index errors abort the build.
    pub async fn build(&self, docs_dir: &Path) -> Result<(FlatIndex, IngestionReport)> {
        if !docs_dir.is_dir() {
            return Err(Error::InvalidInput(format!(
                "documents directory not found: {}",
                docs_dir.display()
            )));
        }

        let mut index = FlatIndex::new(self.embedder.model_name());
        let mut report = IngestionReport::default();
        let files: Vec<PathBuf> = Self::walk_files(docs_dir).collect();
        info!(dir = %docs_dir.display(), files = files.len(), "Ingesting documents");

        for path in files {
            let file = path.display().to_string();
            if !is_supported(&path) {
                warn!(file = %file, "Skipping unsupported file type");
                report.skip(file, "unsupported file type");
                continue;
            }

            let chunks = match self.chunk_file(docs_dir, &path).await {
                Ok(chunks) if chunks.is_empty() => {
                    warn!(file = %file, "Skipping file with no extractable text");
                    report.skip(file, "no extractable text");
                    continue;
                }
                Ok(chunks) => chunks,
                Err(e) => {
                    warn!(file = %file, error = %e, "Skipping unreadable file");
                    report.skip(file, e.to_string());
                    continue;
                }
            };

            let count = chunks.len();
            self.embed_into(&mut index, chunks).await?;
            report.files_indexed += 1;
            report.chunks += count;
            debug!(file = %file, chunks = count, "Indexed file");
        }

        info!(
            files_indexed = report.files_indexed,
            files_skipped = report.files_skipped,
            chunks = report.chunks,
            "Ingestion finished"
        );
        Ok((index, report))
    }

    /// Build the index and persist it under `index_dir`
    pub async fn ingest(&self, docs_dir: &Path, index_dir: &Path) -> Result<(FlatIndex, IngestionReport)> {
        let (index, report) = self.build(docs_dir).await?;
        index.save(index_dir)?;
        Ok((index, report))
    }

    async fn chunk_file(&self, docs_dir: &Path, path: &Path) -> Result<Vec<Chunk>> {
        let owned = path.to_path_buf();
        // pdf-extract may panic on malformed input; a panicked task is a skipped file
        let pages = tokio::task::spawn_blocking(move || extract_pages(&owned))
            .await
            .map_err(|e| Error::Extraction(format!("extraction aborted: {}", e)))??;

        let source = source_name(docs_dir, path);
        let file_path = path.display().to_string();
        Ok(pages
            .iter()
            .flat_map(|page| chunk_page(&source, &file_path, page, &self.config))
            .collect())
    }

    async fn embed_into(&self, index: &mut FlatIndex, chunks: Vec<Chunk>) -> Result<()> {
        let batch_size = self.config.batch_size.max(1);
        let mut chunks = chunks.into_iter().peekable();

        while chunks.peek().is_some() {
            let batch: Vec<Chunk> = chunks.by_ref().take(batch_size).collect();
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }
            for (chunk, vector) in batch.into_iter().zip(vectors) {
                index.push(chunk, vector)?;
            }
        }
        Ok(())
    }

    /// Store an uploaded file in `docs_dir`, overwriting a file of the same name
    pub fn store_upload(docs_dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let file_name = sanitize_file_name(name)?;
        let path = docs_dir.join(&file_name);
        if !is_supported(&path) {
            return Err(Error::InvalidInput(format!(
                "unsupported file type: {} (expected pdf, docx, txt or md)",
                file_name
            )));
        }

        std::fs::create_dir_all(docs_dir)?;
        std::fs::write(&path, bytes)?;
        info!(file = %path.display(), bytes = bytes.len(), "Stored upload");
        Ok(path)
    }
}

/// Path of `path` relative to `docs_dir`, with `/` separators
pub fn source_name(docs_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(docs_dir).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reduce a client-supplied file name to a single safe path component
pub fn sanitize_file_name(name: &str) -> Result<String> {
    let normalized = name.replace('\\', "/");
    let last = normalized.rsplit('/').next().unwrap_or_default().trim();

    let mut components = Path::new(last).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) => Ok(part.to_string_lossy().into_owned()),
        _ => Err(Error::InvalidInput(format!("invalid file name: {:?}", name))),
    }
}

/// Resolve a document name from a URL against `docs_dir`, rejecting traversal
pub fn resolve_document(docs_dir: &Path, name: &str) -> Result<PathBuf> {
    let relative = Path::new(name);
    let safe = !name.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return Err(Error::InvalidInput(format!("invalid document path: {:?}", name)));
    }
    Ok(docs_dir.join(relative))
}
