//! Retrieval-augmented question answering.
//!
//! Answers platform questions from indexed posts and foundations, falling
//! back to the generative model alone when retrieval is unavailable.

pub mod prompt;
pub mod service;
pub mod types;

pub use prompt::{PromptComposer, REFERENCE_HEADER};
pub use service::ChatService;
pub use types::{AnswerState, ChatExchange, APOLOGY};
