//! Filtered similarity ranking.
//!
//! A linear scan over the catalog: filter, score by cosine similarity,
//! stable-sort descending, truncate. Ties keep catalog order.

use std::cmp::Ordering;
use std::sync::Arc;

use assessment_catalog::CatalogStore;
use assessment_embeddings::EmbeddingModel;
use assessment_types::{Assessment, RecommendationQuery};
use tracing::{debug, warn};

use crate::error::RankError;
use crate::filter::{QueryFilter, Rejection};
use crate::similarity::cosine_similarity;

/// A catalog record paired with its similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredAssessment<'a> {
    pub assessment: &'a Assessment,
    /// Position in the catalog
    pub index: usize,
    pub similarity: f32,
}

/// Per-call filter tally, for tracing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterCounts {
    pub scanned: usize,
    pub job_level: usize,
    pub duration: usize,
    pub language: usize,
    pub test_type: usize,
    pub not_indexed: usize,
}

impl FilterCounts {
    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::JobLevel => self.job_level += 1,
            Rejection::Duration => self.duration += 1,
            Rejection::Language => self.language += 1,
            Rejection::TestType => self.test_type += 1,
            Rejection::NotIndexed => self.not_indexed += 1,
        }
    }
}

/// Rank `assessments` against an already-encoded query vector.
///
/// Returns at most `query.top_n` candidates; an empty result is not an
/// error. Fails with `DimensionMismatch` when a candidate that passes every
/// filter has a vector of a different length than `query_vector`.
pub fn rank<'a>(
    assessments: &'a [Assessment],
    query_vector: &[f32],
    query: &RecommendationQuery,
) -> Result<Vec<ScoredAssessment<'a>>, RankError> {
    if query.top_n == 0 {
        return Ok(Vec::new());
    }

    let filter = QueryFilter::from_query(query);
    let mut counts = FilterCounts::default();
    let mut scored = Vec::new();

    for (index, assessment) in assessments.iter().enumerate() {
        counts.scanned += 1;
        if let Err(rejection) = filter.check(assessment) {
            counts.record(rejection);
            continue;
        }

        let Some(vector) = assessment.embedding.as_deref() else {
            counts.record(Rejection::NotIndexed);
            continue;
        };

        if vector.len() != query_vector.len() {
            return Err(RankError::DimensionMismatch {
                name: assessment.name.clone(),
                expected: query_vector.len(),
                actual: vector.len(),
            });
        }

        scored.push(ScoredAssessment {
            assessment,
            index,
            similarity: cosine_similarity(query_vector, vector),
        });
    }

    let survivors = scored.len();

    // Vec::sort_by is stable: equal scores keep catalog order.
    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    scored.truncate(query.top_n);

    if counts.not_indexed > 0 {
        warn!(count = counts.not_indexed, "Skipped assessments without embeddings");
    }
    debug!(
        scanned = counts.scanned,
        survivors,
        returned = scored.len(),
        rejected_job_level = counts.job_level,
        rejected_duration = counts.duration,
        rejected_language = counts.language,
        rejected_test_type = counts.test_type,
        "Ranked catalog"
    );

    Ok(scored)
}

/// Ranks catalog records against free-text queries.
///
/// Holds the store and encoder by `Arc`; both are read-only here, so one
/// recommender can serve concurrent requests.
#[derive(Clone)]
pub struct Recommender {
    store: Arc<CatalogStore>,
    encoder: Arc<dyn EmbeddingModel>,
}

impl Recommender {
    pub fn new(store: Arc<CatalogStore>, encoder: Arc<dyn EmbeddingModel>) -> Self {
        let info = encoder.info();
        if let Some(stored) = &store.catalog().metadata.embedding_version {
            if stored != &info.version {
                warn!(
                    stored = %stored,
                    encoder = %info.version,
                    "Catalog embeddings were produced by a different encoder"
                );
            }
        }
        Self { store, encoder }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn encoder(&self) -> &dyn EmbeddingModel {
        self.encoder.as_ref()
    }

    /// Encode the query text once and rank the catalog against it.
    pub fn recommend(
        &self,
        query: &RecommendationQuery,
    ) -> Result<Vec<ScoredAssessment<'_>>, RankError> {
        debug!(query = %query.query, top_n = query.top_n, "Recommendation request");
        let query_vector = self.encoder.embed(&query.query)?;
        rank(self.store.assessments(), query_vector.as_slice(), query)
    }

    /// Positional form of [`Recommender::recommend`].
    pub fn get_recommendations(
        &self,
        query: &str,
        job_level: Option<&str>,
        duration_max: Option<u32>,
        languages: Option<&[String]>,
        test_type: Option<&str>,
        top_n: usize,
    ) -> Result<Vec<ScoredAssessment<'_>>, RankError> {
        let request = RecommendationQuery {
            query: query.to_string(),
            job_level: job_level.map(str::to_string),
            max_duration: duration_max,
            languages: languages.map(<[String]>::to_vec),
            test_type: test_type.map(str::to_string),
            top_n,
        };
        self.recommend(&request)
    }
}
