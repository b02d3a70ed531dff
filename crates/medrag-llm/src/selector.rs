//! Ordered fallback across answer backends

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use medrag_core::{Answer, AnswerBackend, Prompt, Result};

use crate::config::{BackendConfig, BackendKind};
use crate::fallback::{ContextFallback, FALLBACK_MODEL};
use crate::ollama::OllamaClient;
use crate::openai::OpenAiCompatibleClient;

/// One configured backend as reported to the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendInfo {
    pub label: String,
    pub model: String,
}

/// Readiness of the answer pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorStatus {
    /// True when at least one real backend is configured
    pub ready: bool,
    /// Model of the highest-priority backend, or the fallback
    pub model: String,
    pub backends: Vec<BackendInfo>,
}

/// Tries backends in priority order and returns the first answer.
///
/// When every backend fails the retrieved excerpts are returned instead, so
/// `answer` never fails.
pub struct BackendSelector {
    backends: Vec<Box<dyn AnswerBackend>>,
    fallback: ContextFallback,
}

impl BackendSelector {
    /// Create a selector over already-constructed backends
    pub fn new(backends: Vec<Box<dyn AnswerBackend>>) -> Self {
        Self {
            backends,
            fallback: ContextFallback::new(),
        }
    }

    /// Build the backend list described by the configuration
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let mut backends: Vec<Box<dyn AnswerBackend>> = Vec::new();
        for spec in &config.backends {
            let backend: Box<dyn AnswerBackend> = match spec.kind {
                BackendKind::Ollama => {
                    Box::new(OllamaClient::new(spec.clone(), config.generation.clone())?)
                }
                _ => Box::new(OpenAiCompatibleClient::new(
                    spec.clone(),
                    config.generation.clone(),
                )?),
            };
            info!(backend = backend.label(), model = backend.model_id(), "answer backend configured");
            backends.push(backend);
        }
        Ok(Self::new(backends))
    }

    /// Answer the prompt with the first backend that succeeds
    pub async fn answer(&self, prompt: &Prompt) -> Answer {
        let mut failures = Vec::new();

        for backend in &self.backends {
            match backend.generate(prompt).await {
                Ok(answer) => {
                    info!(backend = backend.label(), "answer generated");
                    return answer;
                }
                Err(e) => {
                    warn!(backend = backend.label(), error = %e, "backend failed, trying next");
                    failures.push(format!("{}: {}", backend.label(), e));
                }
            }
        }

        warn!("all answer backends failed, returning retrieved context");
        self.fallback.answer(prompt, &failures)
    }

    /// Configured backends in priority order
    pub fn status(&self) -> SelectorStatus {
        let backends: Vec<BackendInfo> = self
            .backends
            .iter()
            .map(|b| BackendInfo {
                label: b.label().to_string(),
                model: b.model_id().to_string(),
            })
            .collect();

        SelectorStatus {
            ready: !backends.is_empty(),
            model: backends
                .first()
                .map(|b| b.model.clone())
                .unwrap_or_else(|| FALLBACK_MODEL.to_string()),
            backends,
        }
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
