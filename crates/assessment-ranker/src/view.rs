//! Flattened recommendation records for API and CLI output.

use serde::{Deserialize, Serialize};

use crate::ranker::ScoredAssessment;

/// Most records a single response carries
pub const MAX_VIEW_RESULTS: usize = 10;

/// One recommended assessment as presented to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationView {
    pub name: String,
    pub url: String,
    /// "Yes" or "No"
    pub adaptive_support: String,
    pub description: String,
    /// Minutes, 0 when unknown
    pub duration: u32,
    /// "Yes" or "No"
    pub remote_support: String,
    pub test_type: Vec<String>,
    pub similarity: f32,
}

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}

impl From<&ScoredAssessment<'_>> for RecommendationView {
    fn from(scored: &ScoredAssessment<'_>) -> Self {
        let a = scored.assessment;
        Self {
            name: a.name.clone(),
            url: a.url.clone(),
            adaptive_support: yes_no(a.adaptive_irt_support),
            description: a.description.clone(),
            duration: a.duration_minutes(),
            remote_support: yes_no(a.remote_testing_support),
            test_type: vec![a.test_type.clone()],
            similarity: scored.similarity,
        }
    }
}

/// Convert ranked results into views, keeping at most `MAX_VIEW_RESULTS`.
pub fn to_views(results: &[ScoredAssessment<'_>]) -> Vec<RecommendationView> {
    results
        .iter()
        .take(MAX_VIEW_RESULTS)
        .map(RecommendationView::from)
        .collect()
}
