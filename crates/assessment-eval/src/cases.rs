//! Benchmark test cases and their loader.

use std::path::Path;

use assessment_types::RecommendationQuery;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EvalError;

/// A query paired with the catalog names judged relevant to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub query: String,

    /// Ground truth, matched against catalog names exactly
    #[serde(default)]
    pub relevant_assessments: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u32>,
}

impl TestCase {
    pub fn new<I, S>(query: impl Into<String>, relevant: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            query: query.into(),
            relevant_assessments: relevant.into_iter().map(Into::into).collect(),
            job_level: None,
            languages: None,
            test_type: None,
            max_duration: None,
        }
    }

    pub fn with_job_level(mut self, level: impl Into<String>) -> Self {
        self.job_level = Some(level.into());
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

    pub fn with_max_duration(mut self, minutes: u32) -> Self {
        self.max_duration = Some(minutes);
        self
    }

    /// The ranking request this case issues.
    pub fn to_query(&self, top_n: usize) -> RecommendationQuery {
        RecommendationQuery {
            query: self.query.clone(),
            job_level: self.job_level.clone(),
            max_duration: self.max_duration,
            languages: self.languages.clone(),
            test_type: self.test_type.clone(),
            top_n,
        }
    }
}

/// Built-in cases used when no test-query file exists.
pub fn sample_test_cases() -> Vec<TestCase> {
    vec![
        TestCase::new(
            "Entry level administrative assistant role with focus on customer service",
            ["Administrative Professional - Short Form"],
        )
        .with_job_level("Entry-Level")
        .with_languages(["english"]),
        TestCase::new(
            "Sales manager role requiring leadership skills",
            ["Agency Manager Solution"],
        )
        .with_job_level("Manager")
        .with_languages(["english"]),
    ]
}

/// Read test cases from a JSON array at `path`.
///
/// A missing file falls back to [`sample_test_cases`]; any other read or
/// parse failure is an error.
pub fn load_test_cases(path: impl AsRef<Path>) -> Result<Vec<TestCase>, EvalError> {
    let path = path.as_ref();
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No test query file, using sample queries");
            return Ok(sample_test_cases());
        }
        Err(e) => return Err(e.into()),
    };

    let cases: Vec<TestCase> =
        serde_json::from_slice(&bytes).map_err(|source| EvalError::MalformedQueries {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), count = cases.len(), "Loaded test queries");
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_samples() {
        let dir = TempDir::new().unwrap();
        let cases = load_test_cases(dir.path().join("absent.json")).unwrap();
        assert_eq!(cases, sample_test_cases());
        assert_eq!(cases.len(), 2);
    }

    #[test]
    fn test_load_minimal_cases() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("queries.json");
        std::fs::write(
            &path,
            r#"[
                {"query": "java developer", "relevant_assessments": ["Java 8"]},
                {"query": "manager", "relevant_assessments": [], "job_level": "Manager", "max_duration": 30}
            ]"#,
        )
        .unwrap();

        let cases = load_test_cases(&path).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].relevant_assessments, vec!["Java 8"]);
        assert_eq!(cases[1].job_level.as_deref(), Some("Manager"));
        assert_eq!(cases[1].max_duration, Some(30));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("queries.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_test_cases(&path),
            Err(EvalError::MalformedQueries { .. })
        ));
    }

    #[test]
    fn test_to_query_carries_filters() {
        let case = TestCase::new("q", ["A"])
            .with_test_type("Cognitive")
            .with_max_duration(20);
        let q = case.to_query(10);
        assert_eq!(q.top_n, 10);
        assert_eq!(q.test_type.as_deref(), Some("Cognitive"));
        assert_eq!(q.max_duration, Some(20));
        assert!(q.job_level.is_none());
    }
}
