//! Encoder trait and embedding vector type.

use crate::error::EmbeddingError;

/// Vector embedding, normalized to unit length on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    /// Create a new embedding, normalizing to unit length.
    /// Zero vectors are kept as-is.
    pub fn new(values: Vec<f32>) -> Self {
        let norm: f32 = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        let normalized = if norm > 0.0 {
            values.iter().map(|x| x / norm).collect()
        } else {
            values
        };
        Self { values: normalized }
    }

    /// Wrap a vector that is already normalized (e.g. read back from disk).
    pub fn from_normalized(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

/// Model information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model name (e.g., "all-MiniLM-L6-v2")
    pub name: String,
    /// Version tag; embeddings from different versions must never be mixed
    pub version: String,
    pub dimension: usize,
    /// Maximum sequence length in tokens (0 when the encoder has no limit)
    pub max_sequence_length: usize,
}

/// Text encoder.
///
/// `embed` is a pure function of the input text: the same text always
/// yields the same vector of `info().dimension` values. Empty text is valid.
/// Implementations must be thread-safe (Send + Sync) for concurrent use.
pub trait EmbeddingModel: Send + Sync {
    fn info(&self) -> &ModelInfo;

    /// Generate the embedding for a single text.
    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Generate embeddings for multiple texts.
    /// Default implementation calls embed() for each text.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Generate embeddings for multiple owned strings.
    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        self.embed_batch(&refs)
    }
}

impl<T: EmbeddingModel + ?Sized> EmbeddingModel for Box<T> {
    fn info(&self) -> &ModelInfo {
        (**self).info()
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        (**self).embed_batch(texts)
    }
}

impl<T: EmbeddingModel + ?Sized> EmbeddingModel for std::sync::Arc<T> {
    fn info(&self) -> &ModelInfo {
        (**self).info()
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        (**self).embed_batch(texts)
    }
}
