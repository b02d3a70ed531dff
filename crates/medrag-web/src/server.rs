//! HTTP routes for the MedGPT page and the JSON API

use std::{net::SocketAddr, path::Path as FsPath, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::info;

use medrag_core::RagQuery;
use medrag_rag::QueryEngine;

use crate::error::ApiError;
use crate::history::{ConversationTurn, History};

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QueryEngine>,
    pub history: Arc<History>,
}

impl AppState {
    pub fn new(engine: QueryEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            history: Arc::new(History::default()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub top_k: Option<usize>,
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/query", post(query))
        .route("/api/history", get(history).delete(clear_history))
        .route("/api/upload", post(upload))
        .route("/api/documents/{*name}", get(document))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run_server(engine: QueryEngine) -> anyhow::Result<()> {
    let bind = engine.config().bind_address();
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid host/port for MedRAG server: {}", bind))?;

    let app = app_router(AppState::new(engine));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("MedRAG listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> impl IntoResponse {
    Html(include_str!("../ui/index.html"))
}

async fn health() -> impl IntoResponse {
    Json(json!({"status":"ok","service":"medrag"}))
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    let backends = state.engine.backend_status();
    let index = state.engine.stats().await;
    Json(json!({
        "ready": backends.ready,
        "model": backends.model,
        "backends": backends.backends,
        "index": index,
        "top_k": state.engine.config().top_k,
    }))
}

async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<ConversationTurn>, ApiError> {
    let top_k = request.top_k.unwrap_or(state.engine.config().top_k);
    let outcome = state
        .engine
        .ask(&RagQuery {
            question: request.question,
            top_k,
        })
        .await?;

    let turn = ConversationTurn::from(outcome);
    state.history.record(turn.clone()).await;
    Ok(Json(turn))
}

async fn history(State(state): State<AppState>) -> Json<Vec<ConversationTurn>> {
    Json(state.history.list().await)
}

async fn clear_history(State(state): State<AppState>) -> StatusCode {
    state.history.clear().await;
    StatusCode::NO_CONTENT
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("upload has no file name".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;

        let (path, report) = state.engine.upload(&name, &bytes).await?;
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(name);
        info!(file = %file, chunks = report.chunks, "Upload indexed");
        return Ok(Json(json!({ "file": file, "report": report })));
    }

    Err(ApiError::BadRequest("missing multipart field 'file'".to_string()))
}

async fn document(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let path = state
        .engine
        .document_path(&name)?
        .ok_or_else(|| ApiError::NotFound(format!("document not found: {}", name)))?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::Pipeline(e.into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type(&path))),
            (header::CONTENT_DISPOSITION, HeaderValue::from_static("inline")),
        ],
        bytes,
    )
        .into_response())
}

fn content_type(path: &FsPath) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" | "md" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
