//! Ranking error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankError {
    /// A candidate's stored vector has a different length than the query's
    #[error("Dimension mismatch for {name}: query has {expected}, candidate has {actual}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Embedding error: {0}")]
    Embedding(#[from] assessment_embeddings::EmbeddingError),
}
