//! Context-only fallback used when every answer backend has failed

use async_trait::async_trait;

use medrag_core::{Answer, AnswerBackend, Prompt, Result, FALLBACK_LABEL};

pub const FALLBACK_MODEL: &str = "context-only";

/// Separator placed between retrieved excerpts
pub const EXCERPT_SEPARATOR: &str = "\n\n";

/// Answers with the retrieved excerpts themselves. Never fails.
#[derive(Debug, Default, Clone)]
pub struct ContextFallback;

impl ContextFallback {
    pub fn new() -> Self {
        Self
    }

    /// Build the fallback answer, recording why the backends were skipped
    pub fn answer(&self, prompt: &Prompt, failures: &[String]) -> Answer {
        let text = if prompt.excerpts.is_empty() {
            "No context available.".to_string()
        } else {
            prompt.excerpts.join(EXCERPT_SEPARATOR)
        };

        let mut notice = String::from(
            "Fallback mode active: no answer backend responded, showing the retrieved excerpts.",
        );
        if failures.is_empty() {
            notice.push_str(" No answer backend is configured.");
        } else {
            for failure in failures {
                notice.push_str("\n- ");
                notice.push_str(failure);
            }
        }

        Answer {
            text,
            backend: FALLBACK_LABEL.to_string(),
            model: FALLBACK_MODEL.to_string(),
            notice: Some(notice),
        }
    }
}

#[async_trait]
impl AnswerBackend for ContextFallback {
    async fn generate(&self, prompt: &Prompt) -> Result<Answer> {
        Ok(self.answer(prompt, &[]))
    }

    fn label(&self) -> &str {
        FALLBACK_LABEL
    }

    fn model_id(&self) -> &str {
        FALLBACK_MODEL
    }
}
