use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tokio::sync::mpsc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{debug, warn, Level};

use common::types::Health;
use service::bot::Inbound;

use crate::errors::ApiError;
use crate::telegram::Update;

/// Header Telegram uses to echo the `secret_token` given to `setWebhook`.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Shared handler state: the producer side of the update queue and the
/// expected webhook secret, if any.
#[derive(Clone)]
pub struct AppState {
    pub queue: mpsc::Sender<Inbound>,
    pub secret: Option<String>,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Accept a Telegram update and hand it to the worker. Answers as soon as the
/// event is queued so Telegram does not redeliver it.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> Result<StatusCode, ApiError> {
    if let Some(expected) = &state.secret {
        let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(expected.as_str()) {
            warn!(update_id = update.update_id, "webhook call without a valid secret token");
            return Err(ApiError(StatusCode::UNAUTHORIZED, "invalid secret token".into()));
        }
    }
    let update_id = update.update_id;
    let Some(event) = update.into_inbound() else {
        debug!(update_id, "ignoring non-message update");
        return Ok(StatusCode::OK);
    };
    state.queue.send(event).await.map_err(|_| {
        ApiError(StatusCode::SERVICE_UNAVAILABLE, "update worker is not running".into())
    })?;
    Ok(StatusCode::OK)
}

/// Build the application router: health probe plus the webhook endpoint.
pub fn build_router(state: AppState, webhook_path: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(webhook_path, post(webhook))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
