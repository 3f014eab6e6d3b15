//! Catalog store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, enriching or persisting the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file does not exist
    #[error("Catalog not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but is not a catalog document
    #[error("Malformed catalog {}: {source}", path.display())]
    MalformedData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored vectors disagree with the encoder's dimension
    #[error("Dimension mismatch for {name}: expected {expected}, got {actual}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Embedding error: {0}")]
    Embedding(#[from] assessment_embeddings::EmbeddingError),
}
