//! Chat exchange types.

use crate::types::Document;
use serde::Serialize;

/// Fixed user-facing reply when generation fails.
pub const APOLOGY: &str = "ขออภัยครับ ระบบ AI กำลังประมวลผลหนัก โปรดลองใหม่ในอีกสักครู่";

/// States one `answer` call moves through.
///
/// `Start → Retrieving → (ContextFound | NoContext) → Generating →
/// (Answered | FailedFallback)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerState {
    Start,
    Retrieving,
    ContextFound,
    NoContext,
    Generating,
    Answered,
    FailedFallback,
}

impl AnswerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnswerState::Answered | AnswerState::FailedFallback)
    }
}

/// One transient question/answer exchange. Not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ChatExchange {
    pub query: String,
    pub retrieved_context: Vec<Document>,
    pub composed_prompt: String,
    pub answer: String,
    /// States visited, in order
    pub states: Vec<AnswerState>,
}

impl ChatExchange {
    /// The terminal state reached.
    pub fn outcome(&self) -> Option<AnswerState> {
        self.states.last().copied().filter(AnswerState::is_terminal)
    }

    pub fn used_fallback(&self) -> bool {
        self.outcome() == Some(AnswerState::FailedFallback)
    }
}
