//! # assessment-embeddings
//!
//! Text encoders for the assessment recommender.
//!
//! ## Features
//! - Local inference via Candle (all-MiniLM-L6-v2, 384 dimensions)
//! - Offline feature-hashing encoder for tests and air-gapped use
//! - Automatic model file caching
//! - Persistent embedding cache keyed by encoder version and text

pub mod cache;
pub mod candle;
pub mod error;
pub mod factory;
pub mod hash;
pub mod model;
pub mod store;

pub use crate::candle::CandleEmbedder;
pub use cache::{
    default_cache_dir, get_or_download_model, ModelCache, ModelPaths, DEFAULT_MODEL_REPO, MODEL_FILES,
};
pub use error::EmbeddingError;
pub use factory::encoder_from_settings;
pub use hash::HashEmbedder;
pub use model::{Embedding, EmbeddingModel, ModelInfo};
pub use store::{CacheStats, EmbeddingCache, CF_EMBEDDING_CACHE};
