//! Gemini embedding provider.
//!
//! Uses the Generative Language REST API: `batchEmbedContents` with task
//! type `RETRIEVAL_DOCUMENT` for ingestion and `embedContent` with
//! `RETRIEVAL_QUERY` for search queries.

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use petpal_core::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Values,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<Values>,
}

#[derive(Debug, Deserialize)]
struct Values {
    values: Vec<f32>,
}

/// An [`EmbeddingProvider`] backed by the Gemini embedding API.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    /// Fully qualified model name (`models/embedding-001`)
    model: String,
    dimensions: usize,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: &str, dimensions: usize) -> Self {
        let model = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };

        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model,
            dimensions,
        }
    }

    /// Point the provider at a different endpoint (proxies, test servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn request<'a>(&'a self, text: &'a str, task_type: TaskType) -> EmbedRequest<'a> {
        EmbedRequest {
            model: &self.model,
            content: Content {
                parts: [Part { text }],
            },
            task_type,
        }
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> AppResult<R> {
        let url = format!("{}/{}:{}", self.base_url, self.model, method);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "gemini", error = %e, "embedding request failed");
                AppError::Embedding(format!("Failed to reach Gemini: {}", e))
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::Embedding(
                "Gemini embedding quota exhausted (429)".to_string(),
            ));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Embedding(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Gemini response: {}", e)))
    }

    fn check_dimensions(&self, values: &[f32]) -> AppResult<()> {
        if values.len() != self.dimensions {
            return Err(AppError::Embedding(format!(
                "Unexpected embedding dimensions: got {}, expected {}",
                values.len(),
                self.dimensions
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        self.model.strip_prefix("models/").unwrap_or(&self.model)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "gemini", batch_size = texts.len(), "embedding batch");

        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| self.request(text, TaskType::RetrievalDocument))
                .collect(),
        };
        let response: BatchEmbedResponse = self.post("batchEmbedContents", &body).await?;

        if response.embeddings.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Gemini returned {} embeddings for {} texts",
                response.embeddings.len(),
                texts.len()
            )));
        }

        response
            .embeddings
            .into_iter()
            .map(|e| {
                self.check_dimensions(&e.values)?;
                Ok(e.values)
            })
            .collect()
    }

    async fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        debug!(provider = "gemini", text_len = text.len(), "embedding query");

        let response: EmbedResponse = self
            .post("embedContent", &self.request(text, TaskType::RetrievalQuery))
            .await?;
        self.check_dimensions(&response.embedding.values)?;
        Ok(response.embedding.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name_is_qualified() {
        let provider = GeminiProvider::new("k", "embedding-001", 768);
        assert_eq!(provider.model, "models/embedding-001");
        assert_eq!(provider.model_name(), "embedding-001");

        let provider = GeminiProvider::new("k", "models/text-embedding-004", 768);
        assert_eq!(provider.model, "models/text-embedding-004");
    }

    #[test]
    fn test_request_shapes() {
        let provider = GeminiProvider::new("k", "embedding-001", 768);
        let body = BatchEmbedRequest {
            requests: vec![provider.request("แมว", TaskType::RetrievalDocument)],
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["requests"][0]["model"], "models/embedding-001");
        assert_eq!(json["requests"][0]["taskType"], "RETRIEVAL_DOCUMENT");
        assert_eq!(json["requests"][0]["content"]["parts"][0]["text"], "แมว");

        let query = serde_json::to_value(provider.request("q", TaskType::RetrievalQuery)).unwrap();
        assert_eq!(query["taskType"], "RETRIEVAL_QUERY");
    }

    #[test]
    fn test_dimension_check() {
        let provider = GeminiProvider::new("k", "embedding-001", 3);
        assert!(provider.check_dimensions(&[0.1, 0.2, 0.3]).is_ok());
        assert!(provider.check_dimensions(&[0.1]).is_err());
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let provider = GeminiProvider::new("k", "embedding-001", 768).with_base_url("http://127.0.0.1:9");
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }
}
