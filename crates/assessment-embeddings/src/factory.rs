//! Build the configured encoder.

use assessment_types::{EmbeddingBackend, EmbeddingSettings};
use tracing::info;

use crate::cache::ModelCache;
use crate::candle::CandleEmbedder;
use crate::error::EmbeddingError;
use crate::hash::HashEmbedder;
use crate::model::EmbeddingModel;

/// Construct the encoder selected by `settings`.
///
/// The Candle backend may download model files on first use.
pub fn encoder_from_settings(
    settings: &EmbeddingSettings,
) -> Result<Box<dyn EmbeddingModel>, EmbeddingError> {
    match settings.backend {
        EmbeddingBackend::Candle => {
            let cache = ModelCache::with_optional_dir(
                settings.model_cache_dir.as_deref(),
                settings.model_repo.clone(),
            );
            Ok(Box::new(CandleEmbedder::load(&cache)?))
        }
        EmbeddingBackend::Hash => {
            info!(dim = settings.hash_dimension, "Using hash encoder");
            Ok(Box::new(HashEmbedder::new(settings.hash_dimension)))
        }
    }
}
