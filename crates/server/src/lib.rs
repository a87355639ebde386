//! HTTP boundary for the Petpal chat.
//!
//! - `POST /api/chat`: answer a question
//! - `POST /admin/train-ai`: start a background ingestion run (bearer token)
//! - `GET /api/health`: degraded flag and failure counters

pub mod error;
pub mod routes;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use petpal_core::{AppError, AppResult};
use petpal_knowledge::{ChatService, IngestionController};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub ingestion: Arc<IngestionController>,
    /// Bearer token for the training trigger; `None` disables it
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        chat: Arc<ChatService>,
        ingestion: Arc<IngestionController>,
        admin_token: Option<String>,
    ) -> Self {
        Self {
            chat,
            ingestion,
            admin_token: admin_token.map(Arc::from),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(routes::chat))
        .route("/admin/train-ai", post(routes::train))
        .route("/api/health", get(routes::health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(routes::panic_response))
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(bind: &str, state: AppState) -> AppResult<()> {
    if state.admin_token.is_none() {
        tracing::warn!("No admin token configured, /admin/train-ai is disabled");
    }

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to address {}: {}", bind, e)))?;
    tracing::info!("Petpal server listening on {}", bind);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
