//! Chroma-backed vector index.
//!
//! Talks to a Chroma server over its REST API: `/api/v2` with a tenant and
//! database for Chroma 1.x, or the legacy `/api/v1` for 0.4/0.5 servers. The
//! collection is created lazily with cosine space and its id is cached until
//! the collection is deleted.

use crate::types::{Document, IndexedEntry, MetadataValue, RetrievalHit, SourceKind, SOURCE_KEY};
use crate::vector_index::VectorIndex;
use petpal_core::config::IndexSettings;
use petpal_core::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;

type Metadata = BTreeMap<String, MetadataValue>;

#[derive(Debug, Serialize)]
struct CreateCollection<'a> {
    name: &'a str,
    metadata: serde_json::Value,
    get_or_create: bool,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Debug, Serialize)]
struct AddRequest<'a> {
    ids: Vec<&'a str>,
    embeddings: Vec<&'a [f32]>,
    documents: Vec<&'a str>,
    metadatas: Vec<&'a Metadata>,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query_embeddings: [&'a [f32]; 1],
    n_results: usize,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    filter: Option<serde_json::Value>,
    include: [&'static str; 3],
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Vec<Vec<Option<String>>>,
    #[serde(default)]
    metadatas: Vec<Vec<Option<Metadata>>>,
    #[serde(default)]
    distances: Vec<Vec<f32>>,
}

impl QueryResponse {
    /// Flatten the single-query response into hits; score = 1 - distance.
    fn into_hits(self) -> Vec<RetrievalHit> {
        let documents = self.documents.into_iter().next().unwrap_or_default();
        let mut metadatas = self.metadatas.into_iter().next().unwrap_or_default().into_iter();
        let mut distances = self.distances.into_iter().next().unwrap_or_default().into_iter();

        documents
            .into_iter()
            .filter_map(|content| {
                let metadata = metadatas.next().flatten().unwrap_or_default();
                let distance = distances.next().unwrap_or(1.0);
                content.map(|content| RetrievalHit {
                    document: Document::from_parts(content, metadata),
                    score: 1.0 - distance,
                })
            })
            .collect()
    }
}

/// `where` clause restricting a query to one record kind.
fn source_filter(kind: SourceKind) -> serde_json::Value {
    let mut clause = serde_json::Map::new();
    clause.insert(
        SOURCE_KEY.to_string(),
        serde_json::json!({ "$eq": kind.as_str() }),
    );
    serde_json::Value::Object(clause)
}

/// REST API generation spoken by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChromaApi {
    /// Chroma 0.4 / 0.5
    V1,
    /// Chroma 1.x, collections scoped to a tenant and database
    V2 { tenant: String, database: String },
}

impl ChromaApi {
    pub fn from_settings(settings: &IndexSettings) -> AppResult<Self> {
        match settings.api_version.as_str() {
            "v1" => Ok(Self::V1),
            "v2" => Ok(Self::V2 {
                tenant: settings.tenant.clone(),
                database: settings.database.clone(),
            }),
            other => Err(AppError::Config(format!("Unknown Chroma API version: {}", other))),
        }
    }

    fn version(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 { .. } => "v2",
        }
    }
}

/// Vector index on a remote Chroma server.
pub struct ChromaIndex {
    client: Client,
    base_url: String,
    api: ChromaApi,
    collection: String,
    collection_id: Mutex<Option<String>>,
}

impl ChromaIndex {
    /// Create a client for `collection` on the server at `base_url`.
    pub fn new(
        base_url: &str,
        collection: &str,
        api: ChromaApi,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client for Chroma: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api,
            collection: collection.to_string(),
            collection_id: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}{}", self.base_url, self.api.version(), path)
    }

    fn collections_url(&self, path: &str) -> String {
        match &self.api {
            ChromaApi::V1 => self.url(&format!("/collections{}", path)),
            ChromaApi::V2 { tenant, database } => self.url(&format!(
                "/tenants/{}/databases/{}/collections{}",
                tenant, database, path
            )),
        }
    }

    fn unavailable(&self, e: reqwest::Error) -> AppError {
        AppError::IndexUnavailable(format!("Chroma at {} unreachable: {}", self.base_url, e))
    }

    async fn error_text(response: reqwest::Response) -> String {
        response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string())
    }

    /// Resolve (and create if needed) the collection id.
    async fn collection_id(&self) -> AppResult<String> {
        let mut cached = self.collection_id.lock().await;
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let response = self
            .client
            .post(self.collections_url(""))
            .json(&CreateCollection {
                name: &self.collection,
                metadata: serde_json::json!({ "hnsw:space": "cosine" }),
                get_or_create: true,
            })
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::IndexUnavailable(format!(
                "Chroma rejected collection '{}' ({}): {}",
                self.collection,
                status,
                Self::error_text(response).await
            )));
        }

        let info: CollectionInfo = response.json().await.map_err(|e| {
            AppError::IndexUnavailable(format!("Failed to parse Chroma collection: {}", e))
        })?;

        tracing::debug!(collection = %self.collection, id = %info.id, "Resolved Chroma collection");
        *cached = Some(info.id.clone());
        Ok(info.id)
    }
}

#[async_trait::async_trait]
impl VectorIndex for ChromaIndex {
    fn backend_name(&self) -> &str {
        "chroma"
    }

    async fn heartbeat(&self) -> AppResult<()> {
        let response = self
            .client
            .get(self.url("/heartbeat"))
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        if !response.status().is_success() {
            return Err(AppError::IndexUnavailable(format!(
                "Chroma heartbeat failed ({})",
                response.status()
            )));
        }
        Ok(())
    }

    async fn upsert(&self, entries: &[IndexedEntry]) -> AppResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let id = self.collection_id().await?;
        let body = AddRequest {
            ids: entries.iter().map(|e| e.id.as_str()).collect(),
            embeddings: entries.iter().map(|e| e.embedding.as_slice()).collect(),
            documents: entries.iter().map(|e| e.document.content()).collect(),
            metadatas: entries.iter().map(|e| e.document.metadata()).collect(),
        };

        let response = self
            .client
            .post(self.collections_url(&format!("/{}/add", id)))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::IndexWrite(format!(
                "Chroma rejected {} entries ({}): {}",
                entries.len(),
                status,
                Self::error_text(response).await
            )));
        }

        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        source: Option<SourceKind>,
    ) -> AppResult<Vec<RetrievalHit>> {
        let id = self.collection_id().await?;
        let body = QueryRequest {
            query_embeddings: [query_embedding],
            n_results: top_k,
            filter: source.map(source_filter),
            include: ["documents", "metadatas", "distances"],
        };

        let response = self
            .client
            .post(self.collections_url(&format!("/{}/query", id)))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::IndexUnavailable(format!(
                "Chroma query failed ({}): {}",
                status,
                Self::error_text(response).await
            )));
        }

        let parsed: QueryResponse = response.json().await.map_err(|e| {
            AppError::IndexUnavailable(format!("Failed to parse Chroma query response: {}", e))
        })?;

        let mut hits = parsed.into_hits();
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn delete_collection(&self) -> AppResult<()> {
        let mut cached = self.collection_id.lock().await;

        let response = self
            .client
            .delete(self.collections_url(&format!("/{}", self.collection)))
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(collection = %self.collection, "Deleted Chroma collection");
        } else {
            let text = Self::error_text(response).await;
            let missing = status == StatusCode::NOT_FOUND || text.contains("does not exist");
            if !missing {
                return Err(AppError::IndexWrite(format!(
                    "Chroma failed to delete '{}' ({}): {}",
                    self.collection, status, text
                )));
            }
            tracing::debug!(collection = %self.collection, "Collection already absent");
        }

        *cached = None;
        Ok(())
    }

    async fn count(&self) -> AppResult<usize> {
        let id = self.collection_id().await?;
        let response = self
            .client
            .get(self.collections_url(&format!("/{}/count", id)))
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        if !response.status().is_success() {
            return Err(AppError::IndexUnavailable(format!(
                "Chroma count failed ({})",
                response.status()
            )));
        }

        response
            .json::<usize>()
            .await
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to parse Chroma count: {}", e)))
    }
}
