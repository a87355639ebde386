//! Petpal knowledge: retrieval-augmented chat over platform data.
//!
//! - [`extract`]: renders posts and foundations from the relational store
//!   into documents
//! - [`client`]: embedding model plus vector index, with a degraded mode
//!   when the index is unreachable
//! - [`ingest`]: throttled batch ingestion with per-batch error isolation
//! - [`rag`]: top-k retrieval, prompt composition and answer generation

pub mod chroma_index;
pub mod client;
pub mod embeddings;
pub mod extract;
pub mod ingest;
pub mod memory_index;
pub mod progress;
pub mod rag;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use chroma_index::{ChromaApi, ChromaIndex};
pub use client::{ClientHealth, KnowledgeClient};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use extract::{DocumentExtractor, RecordSource, SqliteRecordSource};
pub use ingest::{IngestionController, IngestionOptions, IngestionSummary};
pub use memory_index::InMemoryIndex;
pub use progress::{ProgressEvent, ProgressPhase, ProgressReporter};
pub use rag::{ChatExchange, ChatService, APOLOGY};
pub use types::{Document, MetadataValue, RetrievalResult, SourceKind};
pub use vector_index::VectorIndex;

use petpal_core::config::IndexSettings;
use petpal_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Build the configured vector index backend.
pub fn create_index(settings: &IndexSettings, timeout: Duration) -> AppResult<Arc<dyn VectorIndex>> {
    match settings.backend.as_str() {
        "chroma" => Ok(Arc::new(ChromaIndex::new(
            &settings.base_url(),
            &settings.collection,
            ChromaApi::from_settings(settings)?,
            timeout,
        )?)),
        "memory" => Ok(Arc::new(InMemoryIndex::new())),
        other => Err(AppError::Config(format!("Unknown index backend: {}", other))),
    }
}
