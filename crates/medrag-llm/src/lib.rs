//! Answer backends for MedRAG
//!
//! This crate provides the hosted and local implementations of the AnswerBackend
//! trait plus the selector that tries them in priority order.

mod config;
mod fallback;
mod ollama;
mod openai;
mod prompt;
mod selector;


pub use config::{BackendConfig, BackendKind, BackendSpec, DEFAULT_BACKEND_ORDER};
pub use fallback::{ContextFallback, EXCERPT_SEPARATOR, FALLBACK_MODEL};
pub use ollama::OllamaClient;
pub use openai::OpenAiCompatibleClient;
pub use prompt::{build_messages, ChatMessage, MAX_CONTEXT_CHARS, SYSTEM_PROMPT};
pub use selector::{BackendInfo, BackendSelector, SelectorStatus};

// Re-export core types for convenience
pub use medrag_core::{Answer, AnswerBackend, Error, GenerationConfig, Prompt, Result};
