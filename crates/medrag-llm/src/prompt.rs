//! Chat message construction

use serde::{Deserialize, Serialize};

use medrag_core::Prompt;

/// Maximum number of context characters forwarded to a backend
pub const MAX_CONTEXT_CHARS: usize = 8000;

pub const SYSTEM_PROMPT: &str = "You are MedGPT, a professional, evidence-based medical assistant. \
Use ONLY the provided context. If the answer is unknown, say so. \
Be concise and clear, suitable for clinicians and students.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Build the system + user messages for a prompt
pub fn build_messages(prompt: &Prompt) -> Vec<ChatMessage> {
    let context: String = prompt.context.chars().take(MAX_CONTEXT_CHARS).collect();
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user".to_string(),
            content: format!("Context:\n{}\n\nQuestion: {}", context, prompt.question),
        },
    ]
}
