//! LLM provider factory.
//!
//! Builds the configured generative model client. Secrets are passed in by
//! the caller, which resolves them from the environment variable named in
//! the configuration.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, OllamaClient};
use crate::types::ProviderType;
use petpal_core::config::LlmSettings;
use petpal_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client from the generative-model settings.
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required API
/// key is missing.
pub fn create_client(
    settings: &LlmSettings,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider = ProviderType::parse(&settings.provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", settings.provider)))?;

    let key = match api_key.filter(|k| !k.trim().is_empty()) {
        Some(key) => key,
        None if provider.requires_api_key() => {
            return Err(AppError::Config(format!(
                "{} provider requires an API key in ${}",
                provider.as_str(),
                settings.api_key_env
            )));
        }
        None => "",
    };

    match provider {
        ProviderType::Ollama => {
            let base_url = settings
                .endpoint
                .as_deref()
                .unwrap_or("http://localhost:11434");
            Ok(Arc::new(OllamaClient::with_base_url(base_url)))
        }
        ProviderType::Gemini => {
            let client = match settings.endpoint.as_deref() {
                Some(endpoint) => GeminiClient::with_base_url(endpoint, key),
                None => GeminiClient::new(key),
            };
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> LlmSettings {
        LlmSettings {
            provider: provider.to_string(),
            ..LlmSettings::default()
        }
    }

    #[test]
    fn test_create_ollama_client() {
        let client = create_client(&settings("ollama"), None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_gemini_client_with_key() {
        let client = create_client(&settings("gemini"), Some("test-key")).unwrap();
        assert_eq!(client.provider_name(), "gemini");
    }

    #[test]
    fn test_gemini_requires_api_key() {
        match create_client(&settings("gemini"), None) {
            Err(AppError::Config(msg)) => assert!(msg.contains("GOOGLE_API_KEY")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("Expected error for Gemini without API key"),
        }
        assert!(create_client(&settings("gemini"), Some("  ")).is_err());
    }

    #[test]
    fn test_unknown_provider() {
        match create_client(&settings("unknown"), None) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
