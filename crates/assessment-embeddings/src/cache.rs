//! Local store for sentence-encoder model files.
//!
//! The three files a BERT encoder needs are fetched from HuggingFace Hub on
//! first use and kept under `<root>/<owner>_<name>/`. Only files that are
//! absent are fetched, and each one lands through a temporary name so a
//! broken transfer never looks complete.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::EmbeddingError;

/// Repository used when the configuration names none
pub const DEFAULT_MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";

/// Every file a BERT sentence encoder is loaded from
pub const MODEL_FILES: [&str; 3] = [CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE];

/// Model files for one repository under a cache root.
#[derive(Debug, Clone)]
pub struct ModelCache {
    pub cache_dir: PathBuf,
    pub repo_id: String,
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new(default_cache_dir(), DEFAULT_MODEL_REPO)
    }
}

/// `<platform cache>/assessment-recommender/models`
pub fn default_cache_dir() -> PathBuf {
    let mut dir = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
    dir.push("assessment-recommender");
    dir.push("models");
    dir
}

impl ModelCache {
    pub fn new(cache_dir: impl Into<PathBuf>, repo_id: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            repo_id: repo_id.into(),
        }
    }

    /// Cache rooted at `cache_dir`, or the platform default when `None`.
    pub fn with_optional_dir(cache_dir: Option<&str>, repo_id: impl Into<String>) -> Self {
        let root = cache_dir.map(PathBuf::from).unwrap_or_else(default_cache_dir);
        Self::new(root, repo_id)
    }

    /// Short model name: the part of the repository id after the owner.
    pub fn model_name(&self) -> &str {
        self.repo_id
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.repo_id)
    }

    pub fn model_dir(&self) -> PathBuf {
        self.cache_dir.join(self.repo_id.replace('/', "_"))
    }

    pub fn paths(&self) -> ModelPaths {
        ModelPaths::in_dir(&self.model_dir())
    }

    /// Files not yet present locally.
    pub fn missing_files(&self) -> Vec<&'static str> {
        let dir = self.model_dir();
        MODEL_FILES
            .into_iter()
            .filter(|f| !dir.join(f).is_file())
            .collect()
    }

    pub fn is_cached(&self) -> bool {
        self.missing_files().is_empty()
    }
}

/// Locations of the three model files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config: dir.join(CONFIG_FILE),
            tokenizer: dir.join(TOKENIZER_FILE),
            weights: dir.join(WEIGHTS_FILE),
        }
    }
}

/// Resolve model files, fetching whichever are missing.
pub fn get_or_download_model(cache: &ModelCache) -> Result<ModelPaths, EmbeddingError> {
    let missing = cache.missing_files();
    if missing.is_empty() {
        debug!(path = ?cache.model_dir(), "Model files present");
    } else {
        info!(repo = %cache.repo_id, files = ?missing, "Fetching model files");
        download_model_files(cache, &missing)?;
    }
    Ok(cache.paths())
}

fn download_model_files(cache: &ModelCache, files: &[&str]) -> Result<(), EmbeddingError> {
    use hf_hub::api::sync::Api;

    let api = Api::new().map_err(|e| EmbeddingError::Download(e.to_string()))?;
    let repo = api.model(cache.repo_id.clone());

    let dir = cache.model_dir();
    fs::create_dir_all(&dir)?;

    for &file in files {
        let fetched = repo
            .get(file)
            .map_err(|e| EmbeddingError::Download(format!("{}: {}", file, e)))?;

        let partial = dir.join(format!("{}.partial", file));
        fs::copy(&fetched, &partial)?;
        fs::rename(&partial, dir.join(file))?;
        debug!(file, "Model file stored");
    }

    Ok(())
}
