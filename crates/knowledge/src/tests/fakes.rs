//! In-process stand-ins for the remote services.

use crate::embeddings::{EmbeddingProvider, TrigramProvider};
use crate::extract::{FoundationRecord, Gender, PetRecord, PostRecord, PostType, RecordSource};
use crate::memory_index::InMemoryIndex;
use crate::types::{IndexedEntry, RetrievalHit, SourceKind};
use crate::vector_index::VectorIndex;
use petpal_core::{AppError, AppResult};
use petpal_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const DIMS: usize = 256;

/// Trigram embedder whose every `n`th batch call is rejected as if the
/// quota were exhausted. Built with [`FailEveryNth::on_queries`] it rejects
/// every `n`th query embedding instead.
#[derive(Debug)]
pub struct FailEveryNth {
    inner: TrigramProvider,
    n: usize,
    queries: bool,
    calls: AtomicUsize,
}

impl FailEveryNth {
    pub fn new(n: usize) -> Self {
        Self {
            inner: TrigramProvider::new(DIMS),
            n,
            queries: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on_queries(n: usize) -> Self {
        Self {
            queries: true,
            ..Self::new(n)
        }
    }

    fn rejects_next(&self) -> bool {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        call % self.n == 0
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FailEveryNth {
    fn provider_name(&self) -> &str {
        "flaky"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if !self.queries && self.rejects_next() {
            return Err(AppError::Embedding("quota exhausted (429)".to_string()));
        }
        self.inner.embed_batch(texts).await
    }

    async fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        if self.queries && self.rejects_next() {
            return Err(AppError::Embedding("quota exhausted (429)".to_string()));
        }
        self.inner.embed_query(text).await
    }
}

/// Trigram embedder that never answers some calls: every query with
/// `queries`, or only the `batch`th batch call.
#[derive(Debug)]
pub struct StallingEmbedder {
    inner: TrigramProvider,
    queries: bool,
    batch: Option<usize>,
    batch_calls: AtomicUsize,
}

impl StallingEmbedder {
    pub fn on_queries() -> Self {
        Self {
            inner: TrigramProvider::new(DIMS),
            queries: true,
            batch: None,
            batch_calls: AtomicUsize::new(0),
        }
    }

    pub fn on_batch(n: usize) -> Self {
        Self {
            queries: false,
            batch: Some(n),
            ..Self::on_queries()
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for StallingEmbedder {
    fn provider_name(&self) -> &str {
        "stalling"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let call = self.batch_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.batch == Some(call) {
            std::future::pending::<()>().await;
        }
        self.inner.embed_batch(texts).await
    }

    async fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        if self.queries {
            std::future::pending::<()>().await;
        }
        self.inner.embed_query(text).await
    }
}

/// In-memory index that counts the calls made against it.
#[derive(Debug, Default)]
pub struct CountingIndex {
    inner: InMemoryIndex,
    pub upserts: AtomicUsize,
    pub searches: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl CountingIndex {
    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.inner.count().await.unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl VectorIndex for CountingIndex {
    fn backend_name(&self) -> &str {
        "counting"
    }

    async fn heartbeat(&self) -> AppResult<()> {
        Ok(())
    }

    async fn upsert(&self, entries: &[IndexedEntry]) -> AppResult<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(entries).await
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        source: Option<SourceKind>,
    ) -> AppResult<Vec<RetrievalHit>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.inner.search(query_embedding, top_k, source).await
    }

    async fn delete_collection(&self) -> AppResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_collection().await
    }

    async fn count(&self) -> AppResult<usize> {
        self.inner.count().await
    }
}

/// Index that is down. With `heartbeat_ok` it answers the heartbeat and
/// fails afterwards.
#[derive(Debug, Default)]
pub struct DownIndex {
    pub heartbeat_ok: bool,
}

impl DownIndex {
    fn down<T>() -> AppResult<T> {
        Err(AppError::IndexUnavailable("connection refused".to_string()))
    }
}

#[async_trait::async_trait]
impl VectorIndex for DownIndex {
    fn backend_name(&self) -> &str {
        "down"
    }

    async fn heartbeat(&self) -> AppResult<()> {
        if self.heartbeat_ok {
            Ok(())
        } else {
            Self::down()
        }
    }

    async fn upsert(&self, _entries: &[IndexedEntry]) -> AppResult<()> {
        Self::down()
    }

    async fn search(
        &self,
        _query_embedding: &[f32],
        _top_k: usize,
        _source: Option<SourceKind>,
    ) -> AppResult<Vec<RetrievalHit>> {
        Self::down()
    }

    async fn delete_collection(&self) -> AppResult<()> {
        Self::down()
    }

    async fn count(&self) -> AppResult<usize> {
        Self::down()
    }
}

/// Index whose heartbeat never returns.
#[derive(Debug, Default)]
pub struct StalledIndex;

#[async_trait::async_trait]
impl VectorIndex for StalledIndex {
    fn backend_name(&self) -> &str {
        "stalled"
    }

    async fn heartbeat(&self) -> AppResult<()> {
        std::future::pending().await
    }

    async fn upsert(&self, _entries: &[IndexedEntry]) -> AppResult<()> {
        std::future::pending().await
    }

    async fn search(
        &self,
        _query_embedding: &[f32],
        _top_k: usize,
        _source: Option<SourceKind>,
    ) -> AppResult<Vec<RetrievalHit>> {
        std::future::pending().await
    }

    async fn delete_collection(&self) -> AppResult<()> {
        std::future::pending().await
    }

    async fn count(&self) -> AppResult<usize> {
        std::future::pending().await
    }
}

#[derive(Debug, Clone)]
pub enum Reply {
    Answer(String),
    Blank,
    Fail,
    Hang,
}

/// Generative model with a fixed reply that records every request.
pub struct ScriptedLlm {
    reply: Reply,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn answering(text: &str) -> Self {
        Self::new(Reply::Answer(text.to_string()))
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let content = match &self.reply {
            Reply::Answer(text) => text.clone(),
            Reply::Blank => "  \n".to_string(),
            Reply::Fail => return Err(AppError::Generation("quota exhausted".to_string())),
            Reply::Hang => std::future::pending::<String>().await,
        };

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
        })
    }
}

/// Record source with a fixed set of records.
#[derive(Debug, Default, Clone)]
pub struct FixedSource {
    pub posts: Vec<PostRecord>,
    pub foundations: Vec<FoundationRecord>,
}

impl FixedSource {
    /// `n` adoption posts, each with its own pet.
    pub fn with_posts(n: usize) -> Self {
        let posts = (1..=n as i64)
            .map(|id| {
                post(
                    id,
                    PostType::Adoption,
                    &format!("น้อง{}", id),
                    &format!("ลูกแมวตัวที่ {} ฉีดวัคซีนแล้ว", id),
                )
            })
            .collect();
        Self {
            posts,
            foundations: Vec::new(),
        }
    }
}

impl RecordSource for FixedSource {
    fn active_posts(&self) -> AppResult<Vec<PostRecord>> {
        Ok(self.posts.clone())
    }

    fn active_foundations(&self) -> AppResult<Vec<FoundationRecord>> {
        Ok(self.foundations.clone())
    }
}

pub fn post(id: i64, post_type: PostType, pet_name: &str, description: &str) -> PostRecord {
    PostRecord {
        id,
        post_type,
        description: description.to_string(),
        contact_phone: Some("0899999999".to_string()),
        pet: Some(PetRecord {
            name: pet_name.to_string(),
            breed: None,
            gender: Gender::Unknown,
        }),
    }
}

pub fn foundation(id: i64, name: &str) -> FoundationRecord {
    FoundationRecord {
        id,
        name: name.to_string(),
        address: "กรุงเทพมหานคร".to_string(),
        phone: "021112222".to_string(),
    }
}
