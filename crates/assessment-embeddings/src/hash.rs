//! Feature-hashing encoder.
//!
//! Deterministic, training-free and offline. Each lower-cased alphanumeric
//! token is hashed into a signed bucket; the bucket vector is L2 normalized.
//! Changing the keys or tokenization changes every vector, so bump
//! `HASH_VERSION` along with them.

use std::hash::Hasher;

use siphasher::sip::SipHasher13;

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel, ModelInfo};

const HASH_SEED_K0: u64 = 0x0123_4567_89ab_cdef;
const HASH_SEED_K1: u64 = 0xfedc_ba98_7654_3210;
const HASH_VERSION: &str = "sip13-v1";

/// Bag-of-words encoder backed by SipHash-1-3 with fixed keys.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    info: ModelInfo,
}

impl HashEmbedder {
    /// Create an encoder producing vectors of `dimension` values (minimum 1).
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            info: ModelInfo {
                name: "hash".to_string(),
                version: format!("hash/{}/d{}", HASH_VERSION, dimension),
                dimension,
                max_sequence_length: 0,
            },
        }
    }

    fn hash(token: &str, salt: u8) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        hasher.write(token.as_bytes());
        hasher.write_u8(salt);
        hasher.finish()
    }
}

/// Lower-cased runs of alphanumeric characters.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

impl EmbeddingModel for HashEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let dim = self.info.dimension;
        let mut vector = vec![0.0f32; dim];

        for token in tokenize(text) {
            let idx = (Self::hash(&token, 0) % dim as u64) as usize;
            let sign = if Self::hash(&token, 1) % 2 == 0 { 1.0 } else { -1.0 };
            vector[idx] += sign;
        }

        Ok(Embedding::new(vector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &Embedding, b: &Embedding) -> f32 {
        a.values.iter().zip(&b.values).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_deterministic() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed("Numerical Reasoning test").unwrap();
        let b = HashEmbedder::new(64).embed("Numerical Reasoning test").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unit_norm() {
        let emb = HashEmbedder::new(128).embed("leadership assessment").unwrap();
        let norm: f32 = emb.values.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {}", norm);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let emb = HashEmbedder::new(32).embed("").unwrap();
        assert_eq!(emb.dimension(), 32);
        assert!(emb.values.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed("Verbal, REASONING!").unwrap();
        let b = embedder.embed("verbal reasoning").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_shared_tokens_score_higher() {
        let embedder = HashEmbedder::new(384);
        let query = embedder.embed("verbal reasoning").unwrap();
        let related = embedder.embed("Verbal Reasoning measures verbal ability").unwrap();
        let unrelated = embedder.embed("forklift safety checklist").unwrap();
        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[test]
    fn test_version_encodes_dimension() {
        assert_ne!(
            HashEmbedder::new(64).info().version,
            HashEmbedder::new(128).info().version
        );
        assert_eq!(HashEmbedder::new(0).info().dimension, 1);
    }
}
