//! End-to-end test infrastructure for the assessment recommender.
//!
//! Provides a shared TestHarness and fixture catalog for E2E tests
//! covering the load -> embed -> rank -> evaluate pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use assessment_catalog::CatalogStore;
use assessment_embeddings::{EmbeddingCache, EmbeddingModel, HashEmbedder};
use assessment_ranker::Recommender;
use assessment_types::{Assessment, Catalog, CatalogMetadata};

/// Dimension of the hash encoder used throughout the E2E suite.
pub const TEST_DIMENSION: usize = 256;

/// Shared test harness for E2E tests.
///
/// Owns a temp directory holding the catalog file and the embedding cache.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Catalog JSON document
    pub catalog_path: PathBuf,
    /// RocksDB embedding cache directory
    pub cache_path: PathBuf,
}

impl TestHarness {
    /// Create a harness with the fixture catalog written to disk, unembedded.
    pub fn new() -> Self {
        Self::with_assessments(fixture_assessments())
    }

    /// Create a harness around an arbitrary catalog.
    pub fn with_assessments(assessments: Vec<Assessment>) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let catalog_path = temp_dir.path().join("data").join("assessments_detailed.json");
        let cache_path = temp_dir.path().join("embedding-cache");

        let harness = Self {
            _temp_dir: temp_dir,
            catalog_path,
            cache_path,
        };
        harness.write_catalog(assessments);
        harness
    }

    /// Overwrite the catalog file with `assessments`.
    pub fn write_catalog(&self, assessments: Vec<Assessment>) {
        let mut catalog = Catalog::new(assessments);
        catalog.metadata = CatalogMetadata {
            scrape_time: Some("2025-01-15 10:30:00".to_string()),
            scraper_user: Some("e2e".to_string()),
            total_assessments: Some(catalog.len()),
            embedding_version: None,
            ..Default::default()
        };
        if let Some(parent) = self.catalog_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create catalog dir");
        }
        let bytes = serde_json::to_vec_pretty(&catalog).expect("Failed to serialize catalog");
        std::fs::write(&self.catalog_path, bytes).expect("Failed to write catalog");
    }

    /// Read the raw catalog document back from disk.
    pub fn read_catalog(&self) -> Catalog {
        let bytes = std::fs::read(&self.catalog_path).expect("Failed to read catalog");
        serde_json::from_slice(&bytes).expect("Failed to parse catalog")
    }

    pub fn load_store(&self) -> CatalogStore {
        CatalogStore::load(&self.catalog_path).expect("Failed to load catalog")
    }

    pub fn open_cache(&self) -> EmbeddingCache {
        EmbeddingCache::open(&self.cache_path).expect("Failed to open embedding cache")
    }

    /// Load, embed (through the cache) and wrap the catalog for ranking.
    pub fn recommender<M>(&self, encoder: Arc<M>) -> Recommender
    where
        M: EmbeddingModel + 'static,
    {
        let mut store = self.load_store();
        let cache = self.open_cache();
        store
            .ensure_embeddings(encoder.as_ref(), Some(&cache))
            .expect("Failed to embed catalog");
        Recommender::new(Arc::new(store), encoder)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Offline encoder used by most E2E tests.
pub fn hash_encoder() -> Arc<HashEmbedder> {
    Arc::new(HashEmbedder::new(TEST_DIMENSION))
}

/// A small catalog spanning the test types, job levels and languages the
/// scraper produces.
pub fn fixture_assessments() -> Vec<Assessment> {
    vec![
        Assessment::new(
            "Verify Numerical Reasoning",
            "Measures numerical reasoning with charts tables and financial data interpretation",
        )
        .with_url("https://catalog.example/verify-numerical")
        .with_job_levels(["Graduate", "Mid-Professional", "Manager"])
        .with_languages(["English (USA)", "French", "German"])
        .with_duration("Approximate Completion Time in minutes = 18")
        .with_test_type("Cognitive"),
        Assessment::new(
            "Verify Verbal Reasoning",
            "Measures verbal reasoning and comprehension of written passages",
        )
        .with_url("https://catalog.example/verify-verbal")
        .with_job_levels(["Graduate", "Mid-Professional"])
        .with_languages(["English (USA)", "Spanish"])
        .with_duration("Approximate Completion Time in minutes = 17")
        .with_test_type("Cognitive"),
        Assessment::new(
            "Occupational Personality Questionnaire",
            "Personality questionnaire describing behavioural style at work and teamwork",
        )
        .with_url("https://catalog.example/opq32")
        .with_job_levels(["Manager", "Director", "Executive"])
        .with_languages(["English (USA)", "French"])
        .with_duration("Approximate Completion Time in minutes = 25")
        .with_test_type("Personality"),
        Assessment::new(
            "Java 8 Programming",
            "Knowledge test of Java programming language features collections and concurrency",
        )
        .with_url("https://catalog.example/java-8")
        .with_job_levels(["Mid-Professional", "Professional Individual Contributor"])
        .with_languages(["English (USA)"])
        .with_duration("Approximate Completion Time in minutes = 30")
        .with_test_type("Skill"),
        Assessment::new(
            "Python Programming",
            "Knowledge test of Python programming data structures and scripting",
        )
        .with_url("https://catalog.example/python")
        .with_job_levels(["Mid-Professional", "Entry-Level"])
        .with_languages(["English (USA)"])
        .with_duration("Approximate Completion Time in minutes = 11")
        .with_test_type("Skill"),
        Assessment::new(
            "Administrative Professional - Short Form",
            "Administrative assistant skills customer service scheduling and office tasks",
        )
        .with_url("https://catalog.example/admin-short")
        .with_job_levels(["Entry-Level"])
        .with_languages(["English (USA)"])
        .with_duration("Approximate Completion Time in minutes = 36")
        .with_test_type("Skill"),
        Assessment::new(
            "Agency Manager Solution",
            "Sales manager leadership coaching and team performance management",
        )
        .with_url("https://catalog.example/agency-manager")
        .with_job_levels(["Manager", "Front Line Manager"])
        .with_languages(["English (USA)"])
        .with_duration("Approximate Completion Time in minutes = 50")
        .with_test_type("General Assessment"),
        Assessment::new(
            "Executive Leadership Scenarios",
            "Scenario based judgement of strategic leadership and executive decision making",
        )
        .with_url("https://catalog.example/exec-leadership")
        .with_job_levels(["Director", "Executive"])
        .with_languages(["English (USA)", "German"])
        .with_duration("Untimed")
        .with_test_type("Personality"),
    ]
}
