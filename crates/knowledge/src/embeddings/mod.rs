//! Embedding models.
//!
//! Provider-agnostic embedding generation: the hosted Gemini model, a local
//! Ollama model, or the offline trigram hasher.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{GeminiProvider, OllamaProvider, TrigramProvider};
