//! Query pipeline types

use serde::{Deserialize, Serialize};

use crate::{Answer, ScoredChunk};

/// Query for retrieval and answering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagQuery {
    pub question: String,
    pub top_k: usize,
}

impl Default for RagQuery {
    fn default() -> Self {
        Self {
            question: String::new(),
            top_k: 3,
        }
    }
}

/// Everything produced by one run of the query pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub question: String,
    pub answer: Answer,
    pub sources: Vec<ScoredChunk>,
    /// Combined context as sent to the backend
    pub context: String,
    pub retrieval_ms: u64,
    pub generation_ms: u64,
}
