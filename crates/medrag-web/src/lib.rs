//! Browser UI and JSON API for MedRAG
//!
//! A single-page interface (query box, upload, history, source viewer) served
//! by axum on top of the query engine.

pub mod error;
pub mod history;
pub mod server;

pub use error::ApiError;
pub use history::{ConversationTurn, History, SourceView, HISTORY_LIMIT};
pub use server::{app_router, run_server, AppState};
