//! Embedding provider trait and factory.

use super::providers::{GeminiProvider, OllamaProvider, TrigramProvider};
use petpal_core::config::EmbeddingSettings;
use petpal_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
///
/// Remote rejections (quota exhaustion, transport failures) surface as
/// `AppError::Embedding`.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "gemini", "ollama", "trigram")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Embed documents destined for the index.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single document (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }

    /// Embed a search query. Providers with asymmetric retrieval models
    /// override this.
    async fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        self.embed(text).await
    }
}

/// Create an embedding provider from the embedding settings.
pub fn create_provider(
    settings: &EmbeddingSettings,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match settings.provider.as_str() {
        "trigram" => Ok(Arc::new(TrigramProvider::new(settings.dimensions))),

        "ollama" => {
            let base_url = settings
                .endpoint
                .as_deref()
                .unwrap_or(super::providers::ollama::DEFAULT_OLLAMA_URL);
            let provider = OllamaProvider::new(base_url, &settings.model, settings.dimensions)?;
            Ok(Arc::new(provider))
        }

        "gemini" => {
            let key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
                AppError::Config(format!(
                    "Gemini embeddings require an API key in ${}",
                    settings.api_key_env
                ))
            })?;
            let mut provider = GeminiProvider::new(key, &settings.model, settings.dimensions);
            if let Some(endpoint) = settings.endpoint.as_deref() {
                provider = provider.with_base_url(endpoint);
            }
            Ok(Arc::new(provider))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: gemini, ollama, trigram",
            settings.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> EmbeddingSettings {
        EmbeddingSettings {
            provider: provider.to_string(),
            dimensions: 384,
            ..EmbeddingSettings::default()
        }
    }

    #[test]
    fn test_create_trigram_provider() {
        let provider = create_provider(&settings("trigram"), None).unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_create_gemini_requires_key() {
        assert!(create_provider(&settings("gemini"), None).is_err());
        let provider = create_provider(&settings("gemini"), Some("test-key")).unwrap();
        assert_eq!(provider.provider_name(), "gemini");
        assert_eq!(provider.model_name(), "embedding-001");
    }

    #[test]
    fn test_create_unknown_provider() {
        let result = create_provider(&settings("openai"), None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&settings("trigram"), None).unwrap();
        let embedding = provider.embed("แมวสีส้ม").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
