//! Recommendation query context.

use serde::{Deserialize, Serialize};

/// Default number of recommendations returned per request
pub const DEFAULT_TOP_N: usize = 5;

/// One ranking request: free text plus optional categorical filters.
///
/// Owned by the caller for the duration of a single ranking call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationQuery {
    /// Search text or job description
    pub query: String,

    /// Keep only assessments listing this job level
    #[serde(default)]
    pub job_level: Option<String>,

    /// Keep only assessments at most this many minutes long
    #[serde(default)]
    pub max_duration: Option<u32>,

    /// Keep only assessments offered in at least one of these languages
    #[serde(default)]
    pub languages: Option<Vec<String>>,

    /// Keep only assessments of exactly this test type
    #[serde(default)]
    pub test_type: Option<String>,

    /// Result cap
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl RecommendationQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            job_level: None,
            max_duration: None,
            languages: None,
            test_type: None,
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_job_level(mut self, job_level: impl Into<String>) -> Self {
        self.job_level = Some(job_level.into());
        self
    }

    pub fn with_max_duration(mut self, minutes: u32) -> Self {
        self.max_duration = Some(minutes);
        self
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = Some(languages.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_test_type(mut self, test_type: impl Into<String>) -> Self {
        self.test_type = Some(test_type.into());
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let q = RecommendationQuery::new("java developer");
        assert_eq!(q.top_n, DEFAULT_TOP_N);
        assert_eq!(q.job_level, None);
        assert_eq!(q.languages, None);
    }

    #[test]
    fn test_deserialize_request_body() {
        let json = r#"{"query": "sales manager", "max_duration": 40, "languages": ["English (USA)"]}"#;
        let q: RecommendationQuery = serde_json::from_str(json).unwrap();
        assert_eq!(q.max_duration, Some(40));
        assert_eq!(q.top_n, DEFAULT_TOP_N);
        assert_eq!(q.languages, Some(vec!["English (USA)".to_string()]));
    }
}
