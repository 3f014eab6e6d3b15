//! Configuration loading for the assessment recommender.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/assessment-recommender/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::query::DEFAULT_TOP_N;

const APP_NAME: &str = "assessment-recommender";

/// Which encoder produces embeddings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// all-MiniLM-L6-v2 through Candle (default)
    #[default]
    Candle,
    /// Offline feature-hashing encoder
    Hash,
}

/// Encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// HuggingFace repository for the Candle backend
    #[serde(default = "default_model_repo")]
    pub model_repo: String,

    /// Directory holding downloaded model files
    #[serde(default)]
    pub model_cache_dir: Option<String>,

    /// Vector dimension for the hash backend
    #[serde(default = "default_hash_dimension")]
    pub hash_dimension: usize,
}

fn default_model_repo() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_hash_dimension() -> usize {
    384
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model_repo: default_model_repo(),
            model_cache_dir: None,
            hash_dimension: default_hash_dimension(),
        }
    }
}

/// Evaluation harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSettings {
    /// Metric cutoff
    #[serde(default = "default_eval_k")]
    pub k: usize,

    /// Candidates ranked per test query; a smaller value is raised to k
    #[serde(default = "default_retrieval_depth")]
    pub retrieval_depth: usize,
}

fn default_eval_k() -> usize {
    5
}

fn default_retrieval_depth() -> usize {
    10
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            k: default_eval_k(),
            retrieval_depth: default_retrieval_depth(),
        }
    }
}

impl EvaluationSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.k == 0 {
            return Err("evaluation.k must be > 0".to_string());
        }
        if self.retrieval_depth == 0 {
            return Err("evaluation.retrieval_depth must be > 0".to_string());
        }
        Ok(())
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the catalog JSON document
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Path to labeled evaluation queries
    #[serde(default = "default_test_queries_path")]
    pub test_queries_path: String,

    /// Path to the RocksDB embedding cache
    #[serde(default = "default_embedding_cache_path")]
    pub embedding_cache_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Number of recommendations when the caller does not say
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,

    #[serde(default)]
    pub embedding: EmbeddingSettings,

    #[serde(default)]
    pub evaluation: EvaluationSettings,
}

fn default_catalog_path() -> String {
    PathBuf::from("data")
        .join("processed")
        .join("assessments_detailed.json")
        .to_string_lossy()
        .to_string()
}

fn default_test_queries_path() -> String {
    PathBuf::from("data")
        .join("evaluation")
        .join("test_queries.json")
        .to_string_lossy()
        .to_string()
}

fn default_embedding_cache_path() -> String {
    ProjectDirs::from("", "", APP_NAME)
        .map(|p| p.data_local_dir().join("embedding-cache"))
        .unwrap_or_else(|| PathBuf::from("./embedding-cache"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            test_queries_path: default_test_queries_path(),
            embedding_cache_path: default_embedding_cache_path(),
            log_level: default_log_level(),
            default_top_n: default_top_n(),
            embedding: EmbeddingSettings::default(),
            evaluation: EvaluationSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/assessment-recommender/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (ASSESSMENT_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from("", "", APP_NAME)
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("catalog_path", default_catalog_path())?
            .set_default("test_queries_path", default_test_queries_path())?
            .set_default("embedding_cache_path", default_embedding_cache_path())?
            .set_default("log_level", default_log_level())?
            .set_default("default_top_n", default_top_n() as i64)?
            .set_default("embedding.model_repo", default_model_repo())?
            .set_default("embedding.hash_dimension", default_hash_dimension() as i64)?
            .set_default("evaluation.k", default_eval_k() as i64)?
            .set_default("evaluation.retrieval_depth", default_retrieval_depth() as i64)?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // ASSESSMENT_LOG_LEVEL, ASSESSMENT_EMBEDDING__BACKEND, ...
        builder = builder.add_source(
            Environment::with_prefix("ASSESSMENT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would make ranking or evaluation meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.evaluation.validate().map_err(ConfigError::Invalid)?;
        if self.embedding.hash_dimension == 0 {
            return Err(ConfigError::Invalid(
                "embedding.hash_dimension must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Expand ~ in a configured path to the home directory.
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs_home() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    pub fn catalog_path(&self) -> PathBuf {
        Self::expand_path(&self.catalog_path)
    }

    pub fn test_queries_path(&self) -> PathBuf {
        Self::expand_path(&self.test_queries_path)
    }

    pub fn embedding_cache_path(&self) -> PathBuf {
        Self::expand_path(&self.embedding_cache_path)
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .or_else(|| std::env::var("HOME").ok().map(PathBuf::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.default_top_n, 5);
        assert_eq!(settings.evaluation.k, 5);
        assert_eq!(settings.evaluation.retrieval_depth, 10);
        assert_eq!(settings.embedding.backend, EmbeddingBackend::Candle);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "catalog_path = \"/tmp/catalog.json\"\n[embedding]\nbackend = \"hash\"\nhash_dimension = 64\n[evaluation]\nk = 3"
        )
        .unwrap();

        let settings = Settings::load(Some(&file.path().to_string_lossy())).unwrap();
        assert_eq!(settings.catalog_path, "/tmp/catalog.json");
        assert_eq!(settings.embedding.backend, EmbeddingBackend::Hash);
        assert_eq!(settings.embedding.hash_dimension, 64);
        assert_eq!(settings.evaluation.k, 3);
        assert_eq!(settings.evaluation.retrieval_depth, 10);
    }

    #[test]
    fn test_zero_k_rejected() {
        let mut settings = Settings::default();
        settings.evaluation.k = 0;
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_expand_plain_path() {
        assert_eq!(
            Settings::expand_path("data/catalog.json"),
            PathBuf::from("data/catalog.json")
        );
    }
}
