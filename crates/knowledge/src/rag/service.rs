//! Query answering service.
//!
//! Retrieves the top-k documents for a question, composes a grounded prompt
//! and asks the generative model for an answer. Neither step can fail the
//! call: retrieval problems mean "no context" and generation problems mean
//! the fixed apology.

use crate::client::KnowledgeClient;
use crate::rag::prompt::PromptComposer;
use crate::rag::types::{AnswerState, ChatExchange, APOLOGY};
use crate::types::Document;
use petpal_core::config::{ChatSettings, LlmSettings};
use petpal_core::{AppError, AppResult};
use petpal_llm::{LlmClient, LlmRequest};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub struct ChatService {
    client: Arc<KnowledgeClient>,
    llm: Arc<dyn LlmClient>,
    composer: PromptComposer,
    model: String,
    top_k: usize,
    temperature: f32,
    max_tokens: Option<u32>,
    generation_timeout: Duration,
    fallbacks: AtomicU64,
}

impl ChatService {
    pub fn new(
        client: Arc<KnowledgeClient>,
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            client,
            llm,
            composer: PromptComposer::new()?,
            model: model.into(),
            top_k: DEFAULT_TOP_K,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            generation_timeout: Duration::from_secs(30),
            fallbacks: AtomicU64::new(0),
        })
    }

    /// Build from the generative-model and chat settings.
    pub fn from_settings(
        client: Arc<KnowledgeClient>,
        llm: Arc<dyn LlmClient>,
        llm_settings: &LlmSettings,
        chat: &ChatSettings,
    ) -> AppResult<Self> {
        let mut service = Self::new(client, llm, llm_settings.model.clone())?
            .with_top_k(chat.top_k)
            .with_temperature(chat.temperature)
            .with_generation_timeout(Duration::from_secs(chat.generation_timeout_secs));
        service.max_tokens = chat.max_tokens;
        Ok(service)
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Answer a user question. Always returns a string.
    pub async fn answer(&self, query: &str) -> String {
        self.exchange(query).await.answer
    }

    /// Answer a user question, returning the full exchange.
    pub async fn exchange(&self, query: &str) -> ChatExchange {
        let mut states = vec![AnswerState::Start, AnswerState::Retrieving];

        let retrieved = self.retrieve(query).await;
        states.push(if retrieved.is_empty() {
            AnswerState::NoContext
        } else {
            AnswerState::ContextFound
        });

        states.push(AnswerState::Generating);
        let (composed_prompt, generated) = match self.composer.compose(query, &retrieved) {
            Ok(prompt) => {
                let generated = self.generate(&prompt).await;
                (prompt, generated)
            }
            Err(e) => (String::new(), Err(e)),
        };

        let answer = match generated {
            Ok(answer) => {
                states.push(AnswerState::Answered);
                answer
            }
            Err(e) => {
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                tracing::error!(error = %e, "Generation failed, returning apology");
                states.push(AnswerState::FailedFallback);
                APOLOGY.to_string()
            }
        };

        ChatExchange {
            query: query.to_string(),
            retrieved_context: retrieved,
            composed_prompt,
            answer,
            states,
        }
    }

    async fn retrieve(&self, query: &str) -> Vec<Document> {
        match self.client.similarity_search(query, self.top_k).await {
            Ok(result) => {
                if !result.is_empty() {
                    tracing::debug!(hits = result.len(), "Found context for query");
                }
                result.into_documents()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Retrieval skipped, answering without context");
                Vec::new()
            }
        }
    }

    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let mut request =
            LlmRequest::new(prompt, self.model.clone()).with_temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = tokio::time::timeout(self.generation_timeout, self.llm.complete(&request))
            .await
            .map_err(|_| {
                AppError::Generation(format!(
                    "{} timed out after {:?}",
                    self.llm.provider_name(),
                    self.generation_timeout
                ))
            })??;

        let answer = response.content.trim();
        if answer.is_empty() {
            return Err(AppError::Generation(format!(
                "{} returned an empty answer",
                self.llm.provider_name()
            )));
        }

        tracing::debug!(
            provider = self.llm.provider_name(),
            model = %response.model,
            completion_tokens = response.usage.completion_tokens,
            "Generated answer"
        );
        Ok(answer.to_string())
    }

    /// How many calls fell back to the apology.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub fn client(&self) -> &Arc<KnowledgeClient> {
        &self.client
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}
