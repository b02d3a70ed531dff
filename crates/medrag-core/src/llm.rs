//! Answer backend trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Result;

/// Label of the context-only fallback backend
pub const FALLBACK_LABEL: &str = "fallback";

/// Configuration for text generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.3,
            top_p: 0.9,
            timeout: Duration::from_secs(60),
        }
    }
}

/// A question together with the retrieved context it should be answered from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub question: String,
    pub context: String,
    /// Raw texts of the retrieved chunks, in rank order
    pub excerpts: Vec<String>,
}

/// Generated answer and the backend that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub backend: String,
    pub model: String,
    pub notice: Option<String>,
}

impl Answer {
    pub fn is_fallback(&self) -> bool {
        self.backend == FALLBACK_LABEL
    }
}

/// Trait for answer-generation backends (hosted APIs, local daemons, fallbacks)
#[async_trait]
pub trait AnswerBackend: Send + Sync {
    /// Generate an answer for the prompt
    async fn generate(&self, prompt: &Prompt) -> Result<Answer>;

    /// Label identifying this backend in answers and status reports
    fn label(&self) -> &str;

    /// Model id served by this backend
    fn model_id(&self) -> &str;
}
