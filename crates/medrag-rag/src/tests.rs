//! End-to-end pipeline tests over temporary document folders

#[cfg(test)]
mod pipeline_tests {
    use crate::{AppConfig, FlatIndex, HashEmbedder, QueryEngine, RagQuery};
    use async_trait::async_trait;
    use insta::assert_yaml_snapshot;
    use medrag_core::{Answer, AnswerBackend, Error, Prompt, Result, SimilarityIndex};
    use medrag_llm::BackendSelector;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct DownBackend;

    #[async_trait]
    impl AnswerBackend for DownBackend {
        async fn generate(&self, _prompt: &Prompt) -> Result<Answer> {
            Err(Error::backend("down", "connection refused"))
        }

        fn label(&self) -> &str {
            "down"
        }

        fn model_id(&self) -> &str {
            "down-model"
        }
    }

    struct EchoBackend;

    #[async_trait]
    impl AnswerBackend for EchoBackend {
        async fn generate(&self, prompt: &Prompt) -> Result<Answer> {
            Ok(Answer {
                text: format!("{} excerpts for: {}", prompt.excerpts.len(), prompt.question),
                backend: "echo".to_string(),
                model: "echo-model".to_string(),
                notice: None,
            })
        }

        fn label(&self) -> &str {
            "echo"
        }

        fn model_id(&self) -> &str {
            "echo-model"
        }
    }

    const HYPERTENSION: &str = "Hypertension is a sustained blood pressure above 140/90 mmHg. \
        Thiazide diuretics are a first-line treatment. ACE inhibitors are preferred in \
        patients with diabetes or chronic kidney disease.";

    const ASTHMA: &str = "Asthma presents with wheeze and reversible airflow obstruction. \
        Inhaled corticosteroids are the mainstay of controller therapy.";

    fn config(dir: &TempDir, extra: &[(&str, &str)]) -> AppConfig {
        let docs = dir.path().join("data").display().to_string();
        let index = dir.path().join("vectorstore").display().to_string();
        let mut vars: HashMap<String, String> = HashMap::from([
            ("MEDRAG_DOCS_DIR".to_string(), docs),
            ("MEDRAG_INDEX_DIR".to_string(), index),
            ("EMBEDDING_PROVIDER".to_string(), "hash".to_string()),
        ]);
        for (k, v) in extra {
            vars.insert(k.to_string(), v.to_string());
        }
        AppConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    fn engine(config: AppConfig, backends: Vec<Box<dyn AnswerBackend>>) -> QueryEngine {
        let embedder = Arc::new(HashEmbedder::new(config.embedding.dimension).unwrap());
        QueryEngine::with_parts(config, embedder, BackendSelector::new(backends)).unwrap()
    }

    fn write_docs(config: &AppConfig) {
        fs::create_dir_all(config.docs_dir.join("respiratory")).unwrap();
        fs::write(config.docs_dir.join("hypertension.txt"), HYPERTENSION).unwrap();
        fs::write(config.docs_dir.join("respiratory/asthma.md"), ASTHMA).unwrap();
        fs::write(config.docs_dir.join("blank.txt"), "  \n ").unwrap();
        fs::write(config.docs_dir.join("xray.png"), [0u8, 1, 2]).unwrap();
    }

    #[tokio::test]
    async fn test_ingestion_report_snapshot() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, &[]);
        write_docs(&config);
        let engine = engine(config, Vec::new());

        let report = engine.rebuild().await.unwrap();
        assert_yaml_snapshot!(report, {
            ".skipped[].path" => "[path]",
        }, @r###"
        files_indexed: 2
        files_skipped: 2
        chunks: 2
        skipped:
          - path: "[path]"
            reason: no extractable text
          - path: "[path]"
            reason: unsupported file type
        "###);

        let stats = engine.stats().await;
        assert!(stats.loaded);
        assert_eq!(stats.total_chunks, 2);
        assert_eq!(stats.dimension, 384);
        assert_eq!(stats.embedding_model, "hash-384");
    }

    #[tokio::test]
    async fn test_chunk_text_ranks_its_own_chunk_first() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, &[("MEDRAG_CHUNK_SIZE", "60"), ("MEDRAG_CHUNK_OVERLAP", "10")]);
        write_docs(&config);
        let index_dir = config.index_dir.clone();
        let engine = engine(config, Vec::new());
        engine.rebuild().await.unwrap();

        let index = FlatIndex::load(&index_dir).unwrap();
        assert!(index.len() > 2);
        for entry in index.entries() {
            let results = engine.retrieve(&entry.chunk.text, 1).await.unwrap();
            assert_eq!(results[0].chunk.id, entry.chunk.id);
        }
    }

    #[tokio::test]
    async fn test_chunks_point_back_into_source() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, &[("MEDRAG_CHUNK_SIZE", "50"), ("MEDRAG_CHUNK_OVERLAP", "5")]);
        write_docs(&config);
        let index_dir = config.index_dir.clone();
        let engine = engine(config, Vec::new());
        engine.rebuild().await.unwrap();

        let index = FlatIndex::load(&index_dir).unwrap();
        let sources: Vec<&str> = index.entries().iter().map(|e| e.chunk.source.as_str()).collect();
        assert!(sources.contains(&"hypertension.txt"));
        assert!(sources.contains(&"respiratory/asthma.md"));

        for entry in index.entries() {
            let page: Vec<char> = fs::read_to_string(&entry.chunk.file_path)
                .unwrap()
                .chars()
                .collect();
            let span: String = page[entry.chunk.start..entry.chunk.end].iter().collect();
            assert_eq!(span, entry.chunk.text);
        }
    }

    #[tokio::test]
    async fn test_rebuild_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, &[("MEDRAG_CHUNK_SIZE", "80"), ("MEDRAG_CHUNK_OVERLAP", "20")]);
        write_docs(&config);
        let engine = engine(config, Vec::new());

        let first = engine.rebuild().await.unwrap();
        let first_stats = engine.stats().await;
        let second = engine.rebuild().await.unwrap();

        assert_eq!(first.chunks, second.chunks);
        assert_eq!(first_stats, engine.stats().await);
    }

    #[tokio::test]
    async fn test_repeated_upload_does_not_duplicate() {
        let dir = TempDir::new().unwrap();
        let engine = engine(config(&dir, &[]), Vec::new());

        let (path, report) = engine.upload("hypertension.txt", HYPERTENSION.as_bytes()).await.unwrap();
        assert!(path.ends_with("hypertension.txt"));
        assert_eq!(report.chunks, 1);

        let (_, report) = engine.upload("hypertension.txt", HYPERTENSION.as_bytes()).await.unwrap();
        assert_eq!(report.chunks, 1);
        assert_eq!(engine.stats().await.total_chunks, 1);
    }

    #[tokio::test]
    async fn test_all_backends_down_returns_excerpts() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, &[]);
        write_docs(&config);
        let engine = engine(config, vec![Box::new(DownBackend), Box::new(DownBackend)]);
        engine.rebuild().await.unwrap();

        let outcome = engine
            .ask(&RagQuery {
                question: "first-line treatment of hypertension".to_string(),
                top_k: 2,
            })
            .await
            .unwrap();

        assert!(outcome.answer.is_fallback());
        assert!(outcome.answer.notice.is_some());
        assert_eq!(outcome.sources.len(), 2);
        let excerpts: Vec<&str> = outcome.sources.iter().map(|s| s.chunk.text.as_str()).collect();
        assert_eq!(outcome.answer.text, excerpts.join("\n\n"));
        assert_eq!(outcome.sources[0].chunk.source, "hypertension.txt");
    }

    #[tokio::test]
    async fn test_answer_from_first_working_backend() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, &[]);
        write_docs(&config);
        let engine = engine(config, vec![Box::new(DownBackend), Box::new(EchoBackend)]);
        engine.rebuild().await.unwrap();

        let outcome = engine
            .ask(&RagQuery {
                question: "  asthma controller therapy ".to_string(),
                top_k: 1,
            })
            .await
            .unwrap();

        assert_eq!(outcome.answer.backend, "echo");
        assert_eq!(outcome.answer.text, "1 excerpts for: asthma controller therapy");
        assert_eq!(outcome.question, "asthma controller therapy");
        assert!(outcome.context.starts_with("[Source: respiratory/asthma.md - Page 1]\n"));
    }

    #[tokio::test]
    async fn test_empty_question_and_empty_index() {
        let dir = TempDir::new().unwrap();
        let engine = engine(config(&dir, &[]), vec![Box::new(EchoBackend)]);

        let err = engine
            .ask(&RagQuery {
                question: "   ".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = engine
            .ask(&RagQuery {
                question: "anything".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Index(_)));
    }

    #[tokio::test]
    async fn test_saved_index_is_reloaded() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, &[]);
        write_docs(&config);
        engine(config.clone(), Vec::new()).rebuild().await.unwrap();

        let reopened = engine(config, Vec::new());
        assert_eq!(reopened.stats().await.total_chunks, 2);
    }

    #[tokio::test]
    async fn test_document_path() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, &[]);
        write_docs(&config);
        let engine = engine(config, Vec::new());

        assert!(engine.document_path("hypertension.txt").unwrap().is_some());
        assert!(engine.document_path("respiratory/asthma.md").unwrap().is_some());
        assert!(engine.document_path("missing.pdf").unwrap().is_none());
        assert!(engine.document_path("../secrets.txt").is_err());
    }

    #[tokio::test]
    async fn test_corrupt_documents_are_skipped() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, &[]);
        fs::create_dir_all(&config.docs_dir).unwrap();
        fs::write(config.docs_dir.join("a.txt"), HYPERTENSION).unwrap();
        fs::write(config.docs_dir.join("bad.pdf"), b"%PDF-1.4 truncated \x00\x01\x02").unwrap();
        fs::write(config.docs_dir.join("bad.docx"), b"PK not really a zip").unwrap();
        let engine = engine(config, Vec::new());

        let report = engine.rebuild().await.unwrap();
        assert_eq!(report.files_indexed, 1);
        assert_eq!(report.files_skipped, 2);
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.path.as_str()).collect();
        assert!(skipped[0].ends_with("bad.docx"));
        assert!(skipped[1].ends_with("bad.pdf"));
        assert_eq!(engine.stats().await.total_chunks, 1);
    }

    #[tokio::test]
    async fn test_pdf_chunks_keep_their_page() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, &[]);
        fs::create_dir_all(&config.docs_dir).unwrap();
        fs::write(
            config.docs_dir.join("guidelines.pdf"),
            include_bytes!("../tests/fixtures/two_pages.pdf"),
        )
        .unwrap();
        let index_dir = config.index_dir.clone();
        let engine = engine(config, Vec::new());

        let report = engine.rebuild().await.unwrap();
        assert_eq!(report.files_indexed, 1);

        let index = FlatIndex::load(&index_dir).unwrap();
        let pages: Vec<usize> = index.entries().iter().map(|e| e.chunk.page).collect();
        assert_eq!(pages, vec![0, 1]);

        let second = &index.entries()[1].chunk;
        assert!(second.is_pdf());
        assert_eq!(second.display_page(), 2);
        let results = engine.retrieve(&second.text, 1).await.unwrap();
        assert_eq!(results[0].chunk.id, second.id);
    }

    #[tokio::test]
    async fn test_corrupt_saved_index_starts_empty() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, &[]);
        fs::create_dir_all(&config.index_dir).unwrap();
        fs::write(FlatIndex::path_in(&config.index_dir), "not json").unwrap();
        write_docs(&config);

        let engine = engine(config, Vec::new());
        let stats = engine.stats().await;
        assert!(!stats.loaded);
        assert_eq!(stats.total_chunks, 0);

        engine.rebuild().await.unwrap();
        assert_eq!(engine.stats().await.total_chunks, 2);
    }

    #[tokio::test]
    async fn test_missing_docs_dir_is_error() {
        let dir = TempDir::new().unwrap();
        let engine = engine(config(&dir, &[]), Vec::new());
        assert!(matches!(engine.rebuild().await, Err(Error::InvalidInput(_))));
    }
}
