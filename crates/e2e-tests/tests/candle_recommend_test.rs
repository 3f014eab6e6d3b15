//! End-to-end recommendation with the all-MiniLM-L6-v2 encoder.
//!
//! NOTE: These tests require the all-MiniLM-L6-v2 model (~80MB download on first run).
//! The model is cached locally after the first download. Run with:
//!   cargo test -p e2e-tests --test candle_recommend_test -- --ignored --nocapture

use std::sync::{Arc, OnceLock};

use pretty_assertions::assert_eq;

use assessment_embeddings::{CandleEmbedder, EmbeddingModel};
use e2e_tests::TestHarness;

/// Shared embedder across tests to avoid concurrent model loading.
static EMBEDDER: OnceLock<Arc<CandleEmbedder>> = OnceLock::new();

fn get_embedder() -> Arc<CandleEmbedder> {
    EMBEDDER
        .get_or_init(|| {
            let embedder =
                CandleEmbedder::load_default().expect("Failed to load embedding model");
            Arc::new(embedder)
        })
        .clone()
}

#[test]
#[ignore = "requires model download (~80MB on first run)"]
fn test_semantic_match_without_shared_words() {
    let harness = TestHarness::new();
    let recommender = harness.recommender(get_embedder());

    // No token overlap with "Java 8 Programming"; only semantics connect them.
    let results = recommender
        .get_recommendations("backend software engineer for JVM services", None, None, None, None, 3)
        .unwrap();
    let top: Vec<&str> = results.iter().map(|r| r.assessment.name.as_str()).collect();
    assert!(
        top.contains(&"Java 8 Programming"),
        "expected Java in top 3, got {:?}",
        top
    );
}

#[test]
#[ignore = "requires model download (~80MB on first run)"]
fn test_catalog_tagged_with_model_version() {
    let harness = TestHarness::new();
    let embedder = get_embedder();
    let _recommender = harness.recommender(embedder.clone());

    let catalog = harness.read_catalog();
    assert!(catalog.embeddings);
    assert_eq!(
        catalog.metadata.embedding_version.as_deref(),
        Some(embedder.info().version.as_str())
    );
    assert_eq!(
        catalog.assessments[0].embedding.as_ref().map(Vec::len),
        Some(embedder.info().dimension)
    );
}
