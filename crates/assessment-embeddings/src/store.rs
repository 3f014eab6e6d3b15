//! Persistent embedding cache.
//!
//! Content-addressed by `(encoder version, text)`: a vector is only reused
//! when produced by the same encoder version from byte-identical text, so
//! switching models or editing a record never serves a stale vector.
//! Stored in RocksDB under its own column family.

use std::path::Path;

use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options, DB};
use tracing::{debug, info};

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel};

/// Column family name for cached vectors
pub const CF_EMBEDDING_CACHE: &str = "embedding_cache";

/// Outcome counters for a cached encoding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

pub struct EmbeddingCache {
    db: DB,
}

impl EmbeddingCache {
    /// Open or create the cache.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EmbeddingError> {
        let path = path.as_ref();

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf = ColumnFamilyDescriptor::new(CF_EMBEDDING_CACHE, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf])?;

        info!(path = ?path, "Opened embedding cache");
        Ok(Self { db })
    }

    fn cf(&self) -> Result<&ColumnFamily, EmbeddingError> {
        self.db
            .cf_handle(CF_EMBEDDING_CACHE)
            .ok_or_else(|| EmbeddingError::Cache(format!("missing column family {}", CF_EMBEDDING_CACHE)))
    }

    fn key(version: &str, text: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(version.len() + 1 + text.len());
        key.extend_from_slice(version.as_bytes());
        key.push(0);
        key.extend_from_slice(text.as_bytes());
        key
    }

    pub fn get(&self, version: &str, text: &str) -> Result<Option<Embedding>, EmbeddingError> {
        match self.db.get_cf(self.cf()?, Self::key(version, text))? {
            Some(bytes) => Ok(Some(Embedding::from_normalized(decode_vector(&bytes)?))),
            None => Ok(None),
        }
    }

    pub fn put(&self, version: &str, text: &str, embedding: &Embedding) -> Result<(), EmbeddingError> {
        self.db
            .put_cf(self.cf()?, Self::key(version, text), encode_vector(&embedding.values))?;
        Ok(())
    }

    /// Number of cached vectors across all encoder versions.
    pub fn count(&self) -> Result<usize, EmbeddingError> {
        let iter = self.db.iterator_cf(self.cf()?, rocksdb::IteratorMode::Start);
        let mut n = 0;
        for item in iter {
            item?;
            n += 1;
        }
        Ok(n)
    }

    /// Encode `texts` with `model`, serving repeats from the cache.
    ///
    /// Only misses reach the model, in a single batch. Results line up with
    /// `texts`.
    pub fn embed_cached<M: EmbeddingModel + ?Sized>(
        &self,
        model: &M,
        texts: &[String],
    ) -> Result<(Vec<Embedding>, CacheStats), EmbeddingError> {
        let version = model.info().version.as_str();
        let dimension = model.info().dimension;

        let mut slots: Vec<Option<Embedding>> = Vec::with_capacity(texts.len());
        let mut missing: Vec<usize> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let cached = self.get(version, text)?.filter(|e| e.dimension() == dimension);
            if cached.is_none() {
                missing.push(i);
            }
            slots.push(cached);
        }

        let stats = CacheStats {
            hits: texts.len() - missing.len(),
            misses: missing.len(),
        };

        if !missing.is_empty() {
            let batch: Vec<&str> = missing.iter().map(|&i| texts[i].as_str()).collect();
            let computed = model.embed_batch(&batch)?;
            for (&i, embedding) in missing.iter().zip(computed) {
                if embedding.dimension() != dimension {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: dimension,
                        actual: embedding.dimension(),
                    });
                }
                self.put(version, &texts[i], &embedding)?;
                slots[i] = Some(embedding);
            }
        }

        debug!(hits = stats.hits, misses = stats.misses, version, "Cached embedding pass");

        slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| EmbeddingError::Cache("encoder returned too few vectors".to_string())))
            .collect::<Result<Vec<_>, _>>()
            .map(|embeddings| (embeddings, stats))
    }
}

fn encode_vector(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Result<Vec<f32>, EmbeddingError> {
    if bytes.len() % 4 != 0 {
        return Err(EmbeddingError::Cache(format!(
            "corrupt cache entry of {} bytes",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashEmbedder;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Counts how many texts reach the wrapped encoder.
    struct CountingEmbedder {
        inner: HashEmbedder,
        calls: AtomicUsize,
    }

    impl EmbeddingModel for CountingEmbedder {
        fn info(&self) -> &crate::model::ModelInfo {
            self.inner.info()
        }

        fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed(text)
        }
    }

    #[test]
    fn test_put_get() {
        let temp = TempDir::new().unwrap();
        let cache = EmbeddingCache::open(temp.path()).unwrap();
        let emb = Embedding::new(vec![3.0, 4.0]);

        cache.put("v1", "hello", &emb).unwrap();
        assert_eq!(cache.get("v1", "hello").unwrap(), Some(emb));
        assert_eq!(cache.get("v2", "hello").unwrap(), None);
        assert_eq!(cache.get("v1", "hello ").unwrap(), None);
        assert_eq!(cache.count().unwrap(), 1);
    }

    #[test]
    fn test_second_pass_is_all_hits() {
        let temp = TempDir::new().unwrap();
        let cache = EmbeddingCache::open(temp.path()).unwrap();
        let model = CountingEmbedder {
            inner: HashEmbedder::new(16),
            calls: AtomicUsize::new(0),
        };
        let texts = vec!["a b".to_string(), "c d".to_string()];

        let (first, stats) = cache.embed_cached(&model, &texts).unwrap();
        assert_eq!(stats, CacheStats { hits: 0, misses: 2 });
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);

        let (second, stats) = cache.embed_cached(&model, &texts).unwrap();
        assert_eq!(stats, CacheStats { hits: 2, misses: 0 });
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let emb = Embedding::new(vec![1.0, 2.0, 2.0]);
        {
            let cache = EmbeddingCache::open(temp.path()).unwrap();
            cache.put("v1", "text", &emb).unwrap();
        }
        let cache = EmbeddingCache::open(temp.path()).unwrap();
        assert_eq!(cache.get("v1", "text").unwrap(), Some(emb));
    }

    #[test]
    fn test_decode_rejects_truncated_entry() {
        assert!(decode_vector(&[0, 0, 0]).is_err());
        assert_eq!(decode_vector(&encode_vector(&[0.5, -1.0])).unwrap(), vec![0.5, -1.0]);
    }
}
