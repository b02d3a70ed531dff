//! In-memory conversation history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::RwLock;

use medrag_core::{QueryOutcome, ScoredChunk};

/// Number of turns kept, newest first
pub const HISTORY_LIMIT: usize = 10;

/// A retrieved source as shown in the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceView {
    pub source: String,
    /// One-based page number
    pub page: usize,
    pub score: f32,
    pub excerpt: String,
    /// URL of the stored document, with a `#page=` anchor for PDFs
    pub document_url: String,
    pub is_pdf: bool,
}

impl From<&ScoredChunk> for SourceView {
    fn from(scored: &ScoredChunk) -> Self {
        let chunk = &scored.chunk;
        let mut document_url = format!("/api/documents/{}", encode_path(&chunk.source));
        if chunk.is_pdf() {
            document_url.push_str(&format!("#page={}", chunk.display_page()));
        }
        Self {
            source: chunk.source.clone(),
            page: chunk.display_page(),
            score: scored.score,
            excerpt: chunk.text.clone(),
            document_url,
            is_pdf: chunk.is_pdf(),
        }
    }
}

/// Percent-encode each `/`-separated segment of a document path
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// One question and its answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub query: String,
    pub answer: String,
    pub backend: String,
    pub model: String,
    pub notice: Option<String>,
    pub sources: Vec<SourceView>,
    pub context: String,
    pub retrieval_ms: u64,
    pub generation_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl From<QueryOutcome> for ConversationTurn {
    fn from(outcome: QueryOutcome) -> Self {
        Self {
            sources: outcome.sources.iter().map(SourceView::from).collect(),
            query: outcome.question,
            answer: outcome.answer.text,
            backend: outcome.answer.backend,
            model: outcome.answer.model,
            notice: outcome.answer.notice,
            context: outcome.context,
            retrieval_ms: outcome.retrieval_ms,
            generation_ms: outcome.generation_ms,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct History {
    turns: RwLock<VecDeque<ConversationTurn>>,
}

impl History {
    pub async fn record(&self, turn: ConversationTurn) {
        let mut turns = self.turns.write().await;
        turns.push_front(turn);
        turns.truncate(HISTORY_LIMIT);
    }

    /// Turns, newest first
    pub async fn list(&self) -> Vec<ConversationTurn> {
        self.turns.read().await.iter().cloned().collect()
    }

    pub async fn clear(&self) {
        self.turns.write().await.clear();
    }
}
