//! Composition root.
//!
//! Every long-lived service is built here from the loaded configuration and
//! handed to the command that needs it.

use petpal_core::config::AppConfig;
use petpal_core::AppResult;
use petpal_knowledge::{
    create_index, create_provider, ChatService, DocumentExtractor, IngestionController,
    IngestionOptions, KnowledgeClient, ProgressReporter, SqliteRecordSource,
};
use std::sync::Arc;
use std::time::Duration;

/// Embedding provider + vector index, degraded if the index is unreachable.
pub async fn knowledge_client(config: &AppConfig) -> AppResult<Arc<KnowledgeClient>> {
    let timeout = Duration::from_secs(config.embedding.timeout_secs.max(1));
    let embedder = create_provider(&config.embedding, config.embedding_api_key().as_deref())?;
    let index = create_index(&config.index, timeout)?;

    tracing::debug!(
        embedder = embedder.provider_name(),
        backend = %config.index.backend,
        url = %config.index.base_url(),
        "Connecting knowledge client"
    );

    Ok(Arc::new(KnowledgeClient::connect(embedder, index, timeout).await))
}

pub fn chat_service(config: &AppConfig, client: Arc<KnowledgeClient>) -> AppResult<ChatService> {
    let llm = petpal_llm::create_client(&config.llm, config.llm_api_key().as_deref())?;
    ChatService::from_settings(client, llm, &config.llm, &config.chat)
}

pub fn ingestion_controller(
    config: &AppConfig,
    client: Arc<KnowledgeClient>,
    options: IngestionOptions,
    progress: ProgressReporter,
) -> IngestionController {
    let source = SqliteRecordSource::new(config.database_path());
    IngestionController::new(DocumentExtractor::new(Arc::new(source)), client, options)
        .with_ledger_path(config.ledger_path())
        .with_progress(progress)
}
