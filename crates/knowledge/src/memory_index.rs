//! In-process vector index using cosine similarity.

use crate::types::{IndexedEntry, RetrievalHit, SourceKind};
use crate::vector_index::{cosine_similarity, VectorIndex};
use petpal_core::AppResult;
use tokio::sync::RwLock;

/// Vector index held in memory, for `index.backend = memory` and tests.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    entries: RwLock<Vec<IndexedEntry>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl VectorIndex for InMemoryIndex {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn heartbeat(&self) -> AppResult<()> {
        Ok(())
    }

    async fn upsert(&self, entries: &[IndexedEntry]) -> AppResult<()> {
        let mut store = self.entries.write().await;
        store.extend_from_slice(entries);
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        source: Option<SourceKind>,
    ) -> AppResult<Vec<RetrievalHit>> {
        let store = self.entries.read().await;

        let mut hits: Vec<RetrievalHit> = store
            .iter()
            .filter(|entry| source.map_or(true, |kind| entry.document.source() == Some(kind)))
            .map(|entry| RetrievalHit {
                document: entry.document.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);

        tracing::debug!("Retrieved {} entries (requested top-{})", hits.len(), top_k);
        Ok(hits)
    }

    async fn delete_collection(&self) -> AppResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.entries.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Document;

    fn normalize(v: &[f32]) -> Vec<f32> {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        v.iter().map(|x| x / norm).collect()
    }

    fn entry(id: &str, text: &str, kind: SourceKind, embedding: &[f32]) -> IndexedEntry {
        IndexedEntry {
            id: id.to_string(),
            embedding: normalize(embedding),
            document: Document::new(text, kind),
        }
    }

    #[tokio::test]
    async fn test_scores_are_ordered_descending() {
        let index = InMemoryIndex::new();
        index
            .upsert(&[
                entry("a", "far", SourceKind::Post, &[-0.3, -0.8, 0.4]),
                entry("b", "near", SourceKind::Post, &[1.0, 0.5, 0.2]),
                entry("c", "middle", SourceKind::Foundation, &[0.5, 0.5, 0.5]),
            ])
            .await
            .unwrap();

        let hits = index.search(&normalize(&[0.9, 0.4, 0.3]), 2, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.content(), "near");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_source_filter() {
        let index = InMemoryIndex::new();
        index
            .upsert(&[
                entry("a", "post", SourceKind::Post, &[1.0, 0.0]),
                entry("b", "foundation", SourceKind::Foundation, &[0.0, 1.0]),
            ])
            .await
            .unwrap();

        let hits = index
            .search(&[1.0, 0.0], 3, Some(SourceKind::Foundation))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.content(), "foundation");
    }

    #[tokio::test]
    async fn test_delete_collection_is_idempotent() {
        let index = InMemoryIndex::new();
        index
            .upsert(&[entry("a", "x", SourceKind::Post, &[1.0])])
            .await
            .unwrap();

        index.delete_collection().await.unwrap();
        index.delete_collection().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
