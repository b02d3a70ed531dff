//! Snapshot tests for core types

#[cfg(test)]
mod snapshot_tests {
    use crate::{Answer, Embedder, GenerationConfig, IndexingConfig, IngestionReport, Result};
    use async_trait::async_trait;
    use insta::assert_yaml_snapshot;

    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn model_name(&self) -> &str {
            "length"
        }
    }

    struct EmptyEmbedder;

    #[async_trait]
    impl Embedder for EmptyEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(Vec::new())
        }

        fn model_name(&self) -> &str {
            "empty"
        }
    }

    #[test]
    fn test_indexing_config_snapshot() {
        assert_yaml_snapshot!(IndexingConfig::default(), @r###"
        chunk_size: 1000
        chunk_overlap: 200
        batch_size: 32
        "###);
    }

    #[test]
    fn test_generation_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.max_tokens, 1024);
        assert!((config.temperature - 0.3).abs() < f32::EPSILON);
        assert!((config.top_p - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.timeout.as_secs(), 60);
    }

    #[test]
    fn test_ingestion_report_snapshot() {
        let mut report = IngestionReport {
            files_indexed: 2,
            chunks: 7,
            ..Default::default()
        };
        report.skip("scan.pdf", "no extractable text");

        assert_yaml_snapshot!(report, @r###"
        files_indexed: 2
        files_skipped: 1
        chunks: 7
        skipped:
          - path: scan.pdf
            reason: no extractable text
        "###);
    }

    #[test]
    fn test_answer_fallback_flag() {
        let answer = Answer {
            text: "excerpt".to_string(),
            backend: crate::FALLBACK_LABEL.to_string(),
            model: "context-only".to_string(),
            notice: Some("Fallback mode".to_string()),
        };
        assert!(answer.is_fallback());

        let served = Answer {
            backend: "groq".to_string(),
            notice: None,
            ..answer
        };
        assert!(!served.is_fallback());
    }

    #[tokio::test]
    async fn test_embed_query_takes_single_vector() {
        let vector = LengthEmbedder.embed_query("fever").await.unwrap();
        assert_eq!(vector, vec![5.0, 1.0]);
    }

    #[tokio::test]
    async fn test_embed_query_without_vector_is_error() {
        let err = EmptyEmbedder.embed_query("fever").await.unwrap_err();
        assert!(err.to_string().contains("no vector"));
    }
}
