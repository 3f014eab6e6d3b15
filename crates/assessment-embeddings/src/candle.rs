//! Candle-based sentence encoder.
//!
//! Runs a BERT sentence-transformer (all-MiniLM-L6-v2 by default, 384
//! dimensions) on CPU. Token states are mean-pooled under the attention
//! mask and L2-normalized.

use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::{Encoding, Tokenizer};
use tracing::{debug, info};

use crate::cache::{get_or_download_model, ModelCache};
use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel, ModelInfo};

/// Embedding dimension for all-MiniLM-L6-v2
pub const EMBEDDING_DIM: usize = 384;

/// Tokens kept per text; longer inputs are truncated
pub const MAX_SEQ_LENGTH: usize = 256;

/// Texts per forward pass. Bounds peak memory when embedding a whole catalog.
pub const MAX_BATCH: usize = 32;

/// Bumped whenever tokenization or pooling changes
const POOLING_VERSION: &str = "mean-l2-v1";

pub struct CandleEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    info: ModelInfo,
}

impl CandleEmbedder {
    /// Load from `cache`, fetching model files on first use.
    pub fn load(cache: &ModelCache) -> Result<Self, EmbeddingError> {
        let paths = get_or_download_model(cache)?;
        Self::load_from_paths(
            cache.model_name(),
            &paths.config,
            &paths.tokenizer,
            &paths.weights,
        )
    }

    pub fn load_default() -> Result<Self, EmbeddingError> {
        Self::load(&ModelCache::default())
    }

    pub fn load_from_paths(
        name: &str,
        config_path: &Path,
        tokenizer_path: &Path,
        weights_path: &Path,
    ) -> Result<Self, EmbeddingError> {
        let raw_config = std::fs::read_to_string(config_path)?;
        let config: BertConfig = serde_json::from_str(&raw_config)
            .map_err(|e| EmbeddingError::ModelNotFound(format!("Invalid config: {}", e)))?;
        let dimension = hidden_size(&raw_config)?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let device = Device::Cpu;
        // SAFETY: the weights file is not modified while mapped
        let weights = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)?
        };
        let model = BertModel::load(weights, &config)?;

        let info = ModelInfo {
            name: name.to_string(),
            version: format!("{}/{}/d{}", name, POOLING_VERSION, dimension),
            dimension,
            max_sequence_length: MAX_SEQ_LENGTH,
        };
        info!(model = name, version = %info.version, "Sentence encoder loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
            info,
        })
    }

    /// One forward pass over at most `MAX_BATCH` texts.
    fn forward_chunk(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        let encodings: Vec<Encoding> = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let rows: Vec<(&[u32], &[u32])> = encodings
            .iter()
            .map(|e| (e.get_ids(), e.get_attention_mask()))
            .collect();
        let batch = PaddedBatch::build(&rows, MAX_SEQ_LENGTH);
        let shape = (batch.rows, batch.width);

        let ids = Tensor::from_vec(batch.ids, shape, &self.device)?;
        let mask = Tensor::from_vec(batch.mask, shape, &self.device)?;
        let token_types = ids.zeros_like()?;

        let hidden = self.model.forward(&ids, &token_types, Some(&mask))?;
        let pooled: Vec<Vec<f32>> = masked_mean(&hidden, &mask)?.to_vec2()?;

        Ok(pooled.into_iter().map(Embedding::new).collect())
    }
}

/// Token ids and attention mask right-padded with zeros to a common width.
#[derive(Debug, PartialEq, Eq)]
struct PaddedBatch {
    ids: Vec<u32>,
    mask: Vec<u32>,
    rows: usize,
    width: usize,
}

impl PaddedBatch {
    /// Width is the longest row, capped at `max_len`.
    fn build(rows: &[(&[u32], &[u32])], max_len: usize) -> Self {
        let width = rows
            .iter()
            .map(|(ids, _)| ids.len())
            .max()
            .unwrap_or(0)
            .min(max_len);

        let mut ids = Vec::with_capacity(rows.len() * width);
        let mut mask = Vec::with_capacity(rows.len() * width);
        for (row_ids, row_mask) in rows {
            let kept = row_ids.len().min(width);
            ids.extend_from_slice(&row_ids[..kept]);
            ids.resize(ids.len() + width - kept, 0);
            mask.extend_from_slice(&row_mask[..kept]);
            mask.resize(mask.len() + width - kept, 0);
        }

        Self {
            ids,
            mask,
            rows: rows.len(),
            width,
        }
    }
}

/// Average `hidden` (batch, seq, dim) over the positions `mask` (batch, seq) keeps.
fn masked_mean(hidden: &Tensor, mask: &Tensor) -> Result<Tensor, EmbeddingError> {
    let weights = mask
        .to_dtype(DType::F32)?
        .unsqueeze(2)?
        .broadcast_as(hidden.shape())?;
    let summed = hidden.broadcast_mul(&weights)?.sum(1)?;
    let counts = weights.sum(1)?.clamp(1e-9, f64::MAX)?;
    Ok(summed.broadcast_div(&counts)?)
}

/// Output dimension declared in a BERT `config.json`.
fn hidden_size(config_json: &str) -> Result<usize, EmbeddingError> {
    let value: serde_json::Value = serde_json::from_str(config_json)
        .map_err(|e| EmbeddingError::ModelNotFound(format!("Invalid config: {}", e)))?;
    value
        .get("hidden_size")
        .and_then(serde_json::Value::as_u64)
        .map(|n| n as usize)
        .ok_or_else(|| EmbeddingError::ModelNotFound("config.json lacks hidden_size".to_string()))
}

impl EmbeddingModel for CandleEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.forward_chunk(&[text])?
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidInput("encoder produced no output".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH) {
            debug!(count = chunk.len(), done = out.len(), total = texts.len(), "Embedding chunk");
            out.extend(self.forward_chunk(chunk)?);
        }
        Ok(out)
    }
}
