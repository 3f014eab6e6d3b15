//! Embedding error types.

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Candle model error
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Model file not found or unreadable
    #[error("Model file not found: {0}")]
    ModelNotFound(String),

    #[error("Failed to download model: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding cache storage error
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl From<rocksdb::Error> for EmbeddingError {
    fn from(err: rocksdb::Error) -> Self {
        EmbeddingError::Cache(err.to_string())
    }
}
