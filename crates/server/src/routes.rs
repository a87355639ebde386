//! Route handlers.

use crate::error::ApiError;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use petpal_core::AppError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::any::Any;
use subtle::ConstantTimeEq;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrainRequest {
    #[serde(default)]
    pub reset: bool,
}

/// `POST /api/chat`
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    let message = request
        .message
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("message is required"))?;

    let response = state.chat.answer(message).await;
    Ok(Json(ChatResponse { response }))
}

/// `POST /admin/train-ai`
///
/// Starts an ingestion run in the background. The body is optional.
pub async fn train(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "training endpoint is disabled",
        ));
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));
    if !provided.is_some_and(|token| tokens_match(token, expected)) {
        tracing::warn!("Rejected training trigger: invalid or missing bearer token");
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "unauthorized"));
    }

    let request: TrainRequest = if body.iter().all(u8::is_ascii_whitespace) {
        TrainRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("invalid body: {}", e)))?
    };

    let permit = state.ingestion.try_begin().map_err(|e| match e {
        AppError::Busy(msg) => ApiError::new(StatusCode::CONFLICT, msg),
        other => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    })?;

    let ingestion = state.ingestion.clone();
    let reset = request.reset;
    tokio::spawn(async move {
        match ingestion.run_with(permit, reset).await {
            Ok(summary) => tracing::info!(
                attempted = summary.attempted,
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Background ingestion finished"
            ),
            Err(e) => tracing::error!(error = %e, "Background ingestion failed"),
        }
    });

    tracing::info!(reset, "Training started");
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "started", "reset": reset })),
    )
        .into_response())
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let index = state.chat.client().health();
    Json(json!({
        "status": if index.degraded { "degraded" } else { "ok" },
        "index": index,
        "generationFallbacks": state.chat.fallback_count(),
    }))
}

/// Response for a panic escaping a handler.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(detail, "Handler panicked");

    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
}

/// Compare without short-circuiting on the first differing byte.
fn tokens_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("s3cret", "s3cret"));
        assert!(!tokens_match("s3cret", "s3creT"));
        assert!(!tokens_match("s3cre", "s3cret"));
        assert!(!tokens_match("", "s3cret"));
    }
}
