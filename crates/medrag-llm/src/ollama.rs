//! Local Ollama daemon backend

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use medrag_core::{Answer, AnswerBackend, Error, GenerationConfig, Prompt, Result};

use crate::config::BackendSpec;
use crate::prompt::{build_messages, ChatMessage};

pub struct OllamaClient {
    spec: BackendSpec,
    generation: GenerationConfig,
    client: Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OllamaClient {
    pub fn new(spec: BackendSpec, generation: GenerationConfig) -> Result<Self> {
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
        let body = ChatRequest {
            model: &self.spec.model,
            messages: &messages,
            stream: false,
            options: ChatOptions {
                temperature: self.generation.temperature,
                top_p: self.generation.top_p,
                num_predict: self.generation.max_tokens,
            },
        };

        let url = format!("{}/api/chat", self.spec.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&body)
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
                format!("POST {} failed: {} {}", url, status, text),
            ));
        }

        parse_chat(&text).map_err(|message| Error::backend(self.label(), message))
    }
}

pub(crate) fn parse_chat(body: &str) -> std::result::Result<String, String> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| format!("decode failed: {} | {}", e, body))?;
    let text = response
        .message
        .and_then(|m| m.content)
        .unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err("empty completion".to_string());
    }
    Ok(text.to_string())
}

#[async_trait]
impl AnswerBackend for OllamaClient {
    async fn generate(&self, prompt: &Prompt) -> Result<Answer> {
        let text = match timeout(self.generation.timeout, self.perform_generation(prompt)).await {
            Ok(result) => result?,
            Err(_) => return Err(Error::Timeout("ollama request timed out".to_string())),
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
