//! Error types for the Petpal RAG service.
//!
//! This module defines a unified error enum covering configuration, the
//! relational record source, the remote embedding / index / generation
//! services, and serialization.

use thiserror::Error;

/// Unified error type for the Petpal RAG service.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic: errors must be represented and propagated (or absorbed,
/// logged and counted where the chat path requires graceful degradation).
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Relational record source errors (posts, pets, foundations)
    #[error("Record store error: {0}")]
    Store(String),

    /// Remote embedding call rejected (typically quota exhaustion)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index rejected a write
    #[error("Index write error: {0}")]
    IndexWrite(String),

    /// Vector index unreachable
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// Search path degraded; callers treat this as "no context"
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// Generative model call failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// A singleton operation (ingestion run) is already in progress
    #[error("Busy: {0}")]
    Busy(String),

    /// Caller supplied an argument outside the accepted domain
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the failure is one of the per-call recoverable conditions of
    /// the remote services. Callers retry later instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Embedding(_)
                | AppError::IndexWrite(_)
                | AppError::IndexUnavailable(_)
                | AppError::RetrievalUnavailable(_)
                | AppError::Generation(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
