//! OpenAI-compatible chat completion client (Groq, OpenRouter, OpenAI)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::debug;

use medrag_core::{Answer, AnswerBackend, Error, GenerationConfig, Prompt, Result};

use crate::config::BackendSpec;
use crate::prompt::{build_messages, ChatMessage};

/// Client for any hosted API speaking the `/chat/completions` protocol
pub struct OpenAiCompatibleClient {
    spec: BackendSpec,
    generation: GenerationConfig,
    client: Client,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl OpenAiCompatibleClient {
    /// Create a new client for a hosted backend
    pub fn new(spec: BackendSpec, generation: GenerationConfig) -> Result<Self> {
        if spec.api_key.as_deref().map_or(true, |k| k.is_empty()) {
            return Err(Error::Configuration(format!(
                "{} backend requires an API key",
                spec.kind
            )));
        }

        let client = Client::builder()
            .timeout(generation.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            spec,
            generation,
            client,
        })
    }

    async fn perform_generation(&self, prompt: &Prompt) -> Result<String> {
        let messages = build_messages(prompt);
        let body = CompletionRequest {
            model: &self.spec.model,
            messages: &messages,
            max_tokens: self.generation.max_tokens,
            temperature: self.generation.temperature,
            top_p: self.generation.top_p,
        };

        let url = format!("{}/chat/completions", self.spec.base_url.trim_end_matches('/'));
        debug!(backend = self.label(), %url, "sending chat completion");

        let mut request = self
            .client
            .post(&url)
            .bearer_auth(self.spec.api_key.as_deref().unwrap_or_default())
            .json(&body);
        for (name, value) in &self.spec.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::backend(
                self.label(),
                format!("request failed with status {}: {}", status, text),
            ));
        }

        parse_completion(&text).map_err(|message| Error::backend(self.label(), message))
    }
}

/// Pull the first non-empty completion out of a response body
pub(crate) fn parse_completion(body: &str) -> std::result::Result<String, String> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|e| format!("decode failed: {} | {}", e, body))?;

    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err("empty completion".to_string());
    }
    Ok(text.to_string())
}

#[async_trait]
impl AnswerBackend for OpenAiCompatibleClient {
    async fn generate(&self, prompt: &Prompt) -> Result<Answer> {
        let text = match timeout(self.generation.timeout, self.perform_generation(prompt)).await {
            Ok(result) => result?,
            Err(_) => return Err(Error::Timeout(format!("{} request timed out", self.label()))),
        };

        Ok(Answer {
            text,
            backend: self.label().to_string(),
            model: self.spec.model.clone(),
            notice: None,
        })
    }

    fn label(&self) -> &str {
        self.spec.kind.label()
    }

    fn model_id(&self) -> &str {
        &self.spec.model
    }
}
