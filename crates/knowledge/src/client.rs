//! Embedding/index client.
//!
//! Couples an embedding provider with a vector index and exposes the three
//! operations the rest of the system needs: upsert, similarity search and
//! clear. When the index is unreachable at connect time the client runs
//! degraded: searches return nothing and writes fail with
//! `AppError::IndexUnavailable`.

use crate::embeddings::EmbeddingProvider;
use crate::types::{Document, IndexedEntry, RetrievalResult, SourceKind};
use crate::vector_index::VectorIndex;
use petpal_core::{AppError, AppResult};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counters for failures the client absorbs or reports.
#[derive(Debug, Default)]
struct HealthCounters {
    retrieval_failures: AtomicU64,
    degraded_searches: AtomicU64,
    upsert_failures: AtomicU64,
}

/// Point-in-time view of the client's health.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClientHealth {
    pub backend: String,
    pub degraded: bool,
    pub retrieval_failures: u64,
    pub degraded_searches: u64,
    pub upsert_failures: u64,
}

pub struct KnowledgeClient {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Option<Arc<dyn VectorIndex>>,
    backend: String,
    timeout: Duration,
    counters: HealthCounters,
}

impl KnowledgeClient {
    /// Connect to the index, falling back to degraded mode if its heartbeat
    /// fails or times out.
    pub async fn connect(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        timeout: Duration,
    ) -> Self {
        let backend = index.backend_name().to_string();

        let reachable = match tokio::time::timeout(timeout, index.heartbeat()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(backend = %backend, error = %e, "Vector index unreachable, running degraded");
                false
            }
            Err(_) => {
                tracing::warn!(backend = %backend, "Vector index heartbeat timed out, running degraded");
                false
            }
        };

        if reachable {
            tracing::info!(
                backend = %backend,
                embedder = embedder.provider_name(),
                model = embedder.model_name(),
                "Knowledge client connected"
            );
        }

        Self {
            embedder,
            index: reachable.then_some(index),
            backend,
            timeout,
            counters: HealthCounters::default(),
        }
    }

    /// Build a client that is degraded from the start.
    pub fn degraded(embedder: Arc<dyn EmbeddingProvider>, backend: impl Into<String>) -> Self {
        Self {
            embedder,
            index: None,
            backend: backend.into(),
            timeout: Duration::from_secs(5),
            counters: HealthCounters::default(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.index.is_none()
    }

    fn live_index(&self) -> AppResult<&Arc<dyn VectorIndex>> {
        self.index.as_ref().ok_or_else(|| {
            AppError::IndexUnavailable(format!("{} index is not connected", self.backend))
        })
    }

    /// Embed and write documents; returns how many entries were written.
    ///
    /// Blank documents are never indexed.
    pub async fn upsert(&self, documents: &[Document]) -> AppResult<usize> {
        let index = self.live_index()?;

        let documents: Vec<&Document> = documents.iter().filter(|d| !d.is_blank()).collect();
        if documents.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = documents.iter().map(|d| d.content().to_string()).collect();
        let embeddings = match tokio::time::timeout(self.timeout, self.embedder.embed_batch(&texts)).await {
            Ok(Ok(embeddings)) => embeddings,
            Ok(Err(e)) => {
                self.counters.upsert_failures.fetch_add(1, Ordering::Relaxed);
                return Err(match e {
                    AppError::Embedding(_) => e,
                    other => AppError::Embedding(other.to_string()),
                });
            }
            Err(_) => {
                self.counters.upsert_failures.fetch_add(1, Ordering::Relaxed);
                return Err(AppError::Embedding(format!(
                    "Embedding timed out after {:?}",
                    self.timeout
                )));
            }
        };

        if embeddings.len() != documents.len() {
            self.counters.upsert_failures.fetch_add(1, Ordering::Relaxed);
            return Err(AppError::Embedding(format!(
                "Expected {} embeddings, got {}",
                documents.len(),
                embeddings.len()
            )));
        }

        let entries: Vec<IndexedEntry> = documents
            .into_iter()
            .zip(embeddings)
            .map(|(document, embedding)| IndexedEntry {
                id: uuid::Uuid::new_v4().to_string(),
                embedding,
                document: document.clone(),
            })
            .collect();

        if let Err(e) = index.upsert(&entries).await {
            self.counters.upsert_failures.fetch_add(1, Ordering::Relaxed);
            return Err(match e {
                AppError::IndexWrite(_) | AppError::IndexUnavailable(_) => e,
                other => AppError::IndexWrite(other.to_string()),
            });
        }

        tracing::debug!("Indexed {} entries", entries.len());
        Ok(entries.len())
    }

    /// Top-k documents most similar to `query`.
    pub async fn similarity_search(&self, query: &str, k: usize) -> AppResult<RetrievalResult> {
        self.similarity_search_filtered(query, k, None).await
    }

    /// Top-k documents most similar to `query`, optionally restricted to one
    /// record kind.
    ///
    /// Embedding or index failures surface as
    /// `AppError::RetrievalUnavailable`. A degraded client returns an empty
    /// result.
    pub async fn similarity_search_filtered(
        &self,
        query: &str,
        k: usize,
        source: Option<SourceKind>,
    ) -> AppResult<RetrievalResult> {
        if k == 0 {
            return Err(AppError::InvalidInput("k must be at least 1".to_string()));
        }

        let Some(index) = self.index.as_ref() else {
            self.counters.degraded_searches.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Degraded index, returning empty retrieval result");
            return Ok(RetrievalResult::empty());
        };

        let search = async {
            let embedding = self.embedder.embed_query(query).await?;
            index.search(&embedding, k, source).await
        };

        match tokio::time::timeout(self.timeout, search).await {
            Ok(Ok(hits)) => Ok(RetrievalResult { hits }),
            Ok(Err(e)) => {
                self.counters.retrieval_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, "Retrieval failed");
                Err(AppError::RetrievalUnavailable(e.to_string()))
            }
            Err(_) => {
                self.counters.retrieval_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Retrieval timed out after {:?}", self.timeout);
                Err(AppError::RetrievalUnavailable(format!(
                    "retrieval timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }

    /// Delete every indexed entry. Safe to call on an empty index.
    pub async fn clear_all(&self) -> AppResult<()> {
        let index = self.live_index()?;
        index.delete_collection().await?;
        tracing::info!(backend = %self.backend, "Cleared all knowledge");
        Ok(())
    }

    /// Number of indexed entries.
    pub async fn count(&self) -> AppResult<usize> {
        self.live_index()?.count().await
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    pub fn health(&self) -> ClientHealth {
        ClientHealth {
            backend: self.backend.clone(),
            degraded: self.is_degraded(),
            retrieval_failures: self.counters.retrieval_failures.load(Ordering::Relaxed),
            degraded_searches: self.counters.degraded_searches.load(Ordering::Relaxed),
            upsert_failures: self.counters.upsert_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::TrigramProvider;
    use crate::memory_index::InMemoryIndex;

    async fn memory_client() -> KnowledgeClient {
        KnowledgeClient::connect(
            Arc::new(TrigramProvider::new(256)),
            Arc::new(InMemoryIndex::new()),
            Duration::from_secs(5),
        )
        .await
    }

    #[tokio::test]
    async fn test_upsert_skips_blank_documents() {
        let client = memory_client().await;
        let written = client
            .upsert(&[
                Document::new("ข้อมูลมูลนิธิ: ชื่อ รักหมา", SourceKind::Foundation),
                Document::new("   ", SourceKind::Post),
            ])
            .await
            .unwrap();

        assert_eq!(written, 1);
        assert_eq!(client.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_zero_k_is_invalid() {
        let client = memory_client().await;
        assert!(matches!(
            client.similarity_search("แมว", 0).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_degraded_client() {
        let client = KnowledgeClient::degraded(Arc::new(TrigramProvider::new(64)), "chroma");

        assert!(client.is_degraded());
        assert!(client.similarity_search("แมว", 3).await.unwrap().is_empty());
        assert!(matches!(
            client.upsert(&[Document::new("x", SourceKind::Post)]).await,
            Err(AppError::IndexUnavailable(_))
        ));
        assert!(matches!(client.clear_all().await, Err(AppError::IndexUnavailable(_))));

        let health = client.health();
        assert!(health.degraded);
        assert_eq!(health.degraded_searches, 1);
    }
}
