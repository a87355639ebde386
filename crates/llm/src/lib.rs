//! Generative model integration for Petpal.
//!
//! This crate provides a provider-agnostic abstraction for text generation.
//!
//! # Providers
//! - **Gemini**: hosted model (default)
//! - **Ollama**: local runtime
//!
//! # Example
//! ```no_run
//! use petpal_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("สวัสดี", "llama3.2").with_temperature(0.7);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{GeminiClient, OllamaClient};
pub use types::ProviderType;
