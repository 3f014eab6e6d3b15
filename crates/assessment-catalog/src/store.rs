//! Catalog store.
//!
//! Owns the assessment records served to the ranker. Loaded once at
//! start-up; `ensure_embeddings` is the only mutation and takes `&mut self`,
//! so it cannot overlap with readers holding `&CatalogStore`.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use assessment_embeddings::{CacheStats, EmbeddingCache, EmbeddingModel};
use assessment_types::{Assessment, Catalog, CatalogField};
use tracing::{debug, info, warn};

use crate::error::CatalogError;

/// Outcome of an `ensure_embeddings` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbeddingReport {
    /// Records that received a new vector
    pub generated: usize,
    /// Of those, how many came from the persistent cache
    pub cache_hits: usize,
    /// Whether the catalog file was rewritten
    pub persisted: bool,
}

/// Summary of the loaded catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub total: usize,
    pub embedded: usize,
    /// Dimension of the first stored vector
    pub dimension: Option<usize>,
    pub embeddings_generated: bool,
    pub embedding_version: Option<String>,
}

pub struct CatalogStore {
    path: PathBuf,
    catalog: Catalog,
}

impl CatalogStore {
    /// Load the catalog document at `path`.
    ///
    /// A document without an `assessments` key loads as an empty catalog.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref().to_path_buf();

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(CatalogError::NotFound(path)),
            Err(e) => return Err(e.into()),
        };

        let mut catalog: Catalog =
            serde_json::from_slice(&bytes).map_err(|source| CatalogError::MalformedData {
                path: path.clone(),
                source,
            })?;

        let claimed = catalog.embeddings;
        catalog.refresh_embeddings_flag();
        if claimed && !catalog.embeddings {
            warn!(
                path = ?path,
                missing = catalog.missing_embeddings(),
                "Catalog claims embeddings but some records lack them"
            );
        }

        info!(
            path = ?path,
            assessments = catalog.len(),
            embeddings = catalog.embeddings,
            "Loaded catalog"
        );

        Ok(Self { path, catalog })
    }

    /// Wrap an in-memory catalog that persists to `path`.
    pub fn from_catalog(path: impl Into<PathBuf>, mut catalog: Catalog) -> Self {
        catalog.refresh_embeddings_flag();
        Self {
            path: path.into(),
            catalog,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn assessments(&self) -> &[Assessment] {
        &self.catalog.assessments
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn embeddings_generated(&self) -> bool {
        self.catalog.embeddings
    }

    /// Fill in missing embeddings and persist the enriched catalog.
    ///
    /// Each missing vector is `encoder.embed(name + " " + description)`,
    /// served from `cache` when the same encoder version has seen the same
    /// text. A no-op (no encoding, no write) once every record is embedded.
    pub fn ensure_embeddings<M>(
        &mut self,
        encoder: &M,
        cache: Option<&EmbeddingCache>,
    ) -> Result<EmbeddingReport, CatalogError>
    where
        M: EmbeddingModel + ?Sized,
    {
        if self.catalog.embeddings {
            debug!(path = ?self.path, "Embeddings already generated");
            return Ok(EmbeddingReport::default());
        }

        let info = encoder.info().clone();

        if let Some(stored) = &self.catalog.metadata.embedding_version {
            let has_vectors = self.catalog.assessments.iter().any(Assessment::has_embedding);
            if has_vectors && stored != &info.version {
                warn!(
                    stored = %stored,
                    current = %info.version,
                    "Mixing embeddings from different encoders; run with a full re-embed"
                );
            }
        }

        for assessment in &self.catalog.assessments {
            if let Some(vector) = &assessment.embedding {
                if vector.len() != info.dimension {
                    return Err(CatalogError::DimensionMismatch {
                        name: assessment.name.clone(),
                        expected: info.dimension,
                        actual: vector.len(),
                    });
                }
            }
        }

        let missing: Vec<usize> = self
            .catalog
            .assessments
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.has_embedding())
            .map(|(i, _)| i)
            .collect();
        let texts: Vec<String> = missing
            .iter()
            .map(|&i| self.catalog.assessments[i].embedding_text())
            .collect();

        info!(count = missing.len(), model = %info.name, "Generating embeddings for assessments");

        let (embeddings, stats) = match cache {
            Some(cache) => cache.embed_cached(encoder, &texts)?,
            None => (
                encoder.embed_texts(&texts)?,
                CacheStats {
                    hits: 0,
                    misses: texts.len(),
                },
            ),
        };

        if embeddings.len() != missing.len() {
            return Err(CatalogError::Serialization(format!(
                "encoder returned {} vectors for {} texts",
                embeddings.len(),
                missing.len()
            )));
        }

        if let Some((&i, embedding)) = missing
            .iter()
            .zip(&embeddings)
            .find(|(_, e)| e.dimension() != info.dimension)
        {
            return Err(CatalogError::DimensionMismatch {
                name: self.catalog.assessments[i].name.clone(),
                expected: info.dimension,
                actual: embedding.dimension(),
            });
        }

        for (&i, embedding) in missing.iter().zip(embeddings) {
            self.catalog.assessments[i].embedding = Some(embedding.into_vec());
        }

        self.catalog.refresh_embeddings_flag();
        self.catalog.metadata.embedding_version = Some(info.version);
        self.catalog.metadata.total_assessments = Some(self.catalog.len());
        self.save()?;

        Ok(EmbeddingReport {
            generated: missing.len(),
            cache_hits: stats.hits,
            persisted: true,
        })
    }

    /// Drop every stored vector so the next `ensure_embeddings` re-encodes
    /// the whole catalog (e.g. after switching encoders). Not persisted.
    pub fn invalidate_embeddings(&mut self) {
        for assessment in &mut self.catalog.assessments {
            assessment.embedding = None;
        }
        self.catalog.metadata.embedding_version = None;
        self.catalog.refresh_embeddings_flag();
    }

    /// Write the catalog back to its file.
    ///
    /// Goes through a sibling temporary file and a rename so an interrupted
    /// write leaves the previous document intact.
    pub fn save(&self) -> Result<(), CatalogError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_vec_pretty(&self.catalog)
            .map_err(|e| CatalogError::Serialization(e.to_string()))?;

        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;

        info!(path = ?self.path, assessments = self.catalog.len(), "Persisted catalog");
        Ok(())
    }

    /// Sorted unique values of `field` across the catalog.
    pub fn unique_values(&self, field: CatalogField) -> Vec<String> {
        self.catalog
            .assessments
            .iter()
            .flat_map(|a| field.values(a))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Name -> first catalog index.
    pub fn name_index(&self) -> HashMap<&str, usize> {
        let mut index = HashMap::with_capacity(self.catalog.len());
        for (i, assessment) in self.catalog.assessments.iter().enumerate() {
            index.entry(assessment.name.as_str()).or_insert(i);
        }
        index
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            total: self.catalog.len(),
            embedded: self.catalog.len() - self.catalog.missing_embeddings(),
            dimension: self
                .catalog
                .assessments
                .iter()
                .find_map(|a| a.embedding.as_ref().map(Vec::len)),
            embeddings_generated: self.catalog.embeddings,
            embedding_version: self.catalog.metadata.embedding_version.clone(),
        }
    }
}
