//! Vector index abstraction.
//!
//! Defines a trait for provider-agnostic vector storage and retrieval.

use crate::types::{IndexedEntry, RetrievalHit, SourceKind};
use petpal_core::AppResult;

/// Trait for vector index backends.
///
/// Implementations report an unreachable service as
/// `AppError::IndexUnavailable` and a rejected write as
/// `AppError::IndexWrite`.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Backend name, for logs and stats.
    fn backend_name(&self) -> &str;

    /// Check that the backing service is reachable.
    async fn heartbeat(&self) -> AppResult<()>;

    /// Append entries. Entries are never updated in place.
    async fn upsert(&self, entries: &[IndexedEntry]) -> AppResult<()>;

    /// Search for the top-k most similar entries to the query embedding,
    /// optionally restricted to one record kind.
    ///
    /// Returns hits ordered by descending similarity score.
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        source: Option<SourceKind>,
    ) -> AppResult<Vec<RetrievalHit>>;

    /// Remove every entry. Deleting an already-empty index is a no-op.
    async fn delete_collection(&self) -> AppResult<()>;

    /// Number of stored entries.
    async fn count(&self) -> AppResult<usize>;
}

/// Cosine similarity between two vectors; 0.0 for mismatched lengths or
/// zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
