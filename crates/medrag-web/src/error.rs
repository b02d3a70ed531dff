//! Mapping pipeline errors to HTTP responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

use medrag_core::Error;

/// Error returned by API handlers, rendered as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Pipeline(Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(err) => match err {
                Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                Error::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
                Error::Index(_) => StatusCode::CONFLICT,
                Error::Embedding(_) | Error::Network(_) | Error::Backend { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Pipeline(err) => err.to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Pipeline(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %message, "Request failed");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
