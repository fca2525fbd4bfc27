use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

/// Handler error rendered as a JSON body with the given status.
#[derive(Debug)]
pub struct ApiError(pub StatusCode, pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError(status, msg) = self;
        error!(%status, error = %msg, "request failed");
        (status, Json(serde_json::json!({"error": msg}))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
}

/// Failures talking to the Telegram Bot API.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to call {method}: {message}")]
    Http { method: &'static str, message: String },
    #[error("Telegram API error: {description} (code {code})")]
    Api { description: String, code: u64 },
    #[error("invalid response from {method}: {message}")]
    InvalidResponse { method: &'static str, message: String },
}
