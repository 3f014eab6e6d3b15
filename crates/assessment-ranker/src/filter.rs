//! Categorical filters applied before scoring.

use assessment_types::{Assessment, RecommendationQuery};

/// Why a record was excluded from ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    JobLevel,
    Duration,
    Language,
    TestType,
    /// Record has no vector yet
    NotIndexed,
}

/// Borrowed view of the active filters in a query.
///
/// Empty strings and empty language lists count as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryFilter<'q> {
    pub job_level: Option<&'q str>,
    pub max_duration: Option<u32>,
    pub languages: Option<&'q [String]>,
    pub test_type: Option<&'q str>,
}

impl<'q> QueryFilter<'q> {
    pub fn from_query(query: &'q RecommendationQuery) -> Self {
        Self {
            job_level: query.job_level.as_deref().filter(|s| !s.is_empty()),
            max_duration: query.max_duration,
            languages: query.languages.as_deref().filter(|l| !l.is_empty()),
            test_type: query.test_type.as_deref().filter(|s| !s.is_empty()),
        }
    }

    /// Check `assessment` against every active filter, in order.
    pub fn check(&self, assessment: &Assessment) -> Result<(), Rejection> {
        if let Some(level) = self.job_level {
            if !assessment.job_levels.iter().any(|l| l == level) {
                return Err(Rejection::JobLevel);
            }
        }

        if let Some(max) = self.max_duration {
            // Unparsable durations read as 0 and always pass.
            if assessment.duration_minutes() > max {
                return Err(Rejection::Duration);
            }
        }

        if let Some(wanted) = self.languages {
            if !wanted.iter().any(|w| assessment.languages.contains(w)) {
                return Err(Rejection::Language);
            }
        }

        if let Some(test_type) = self.test_type {
            if assessment.test_type != test_type {
                return Err(Rejection::TestType);
            }
        }

        if !assessment.has_embedding() {
            return Err(Rejection::NotIndexed);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Assessment {
        Assessment::new("Verify Numerical", "numbers")
            .with_job_levels(["Graduate", "Manager"])
            .with_languages(["English (USA)", "French"])
            .with_duration("Approximate Completion Time in minutes = 30")
            .with_test_type("Cognitive")
            .with_embedding(vec![1.0, 0.0])
    }

    #[test]
    fn test_no_filters_accepts_indexed_record() {
        let q = RecommendationQuery::new("anything");
        assert_eq!(QueryFilter::from_query(&q).check(&record()), Ok(()));
    }

    #[test]
    fn test_job_level_membership() {
        let q = RecommendationQuery::new("x").with_job_level("Manager");
        assert_eq!(QueryFilter::from_query(&q).check(&record()), Ok(()));
        let q = RecommendationQuery::new("x").with_job_level("Director");
        assert_eq!(QueryFilter::from_query(&q).check(&record()), Err(Rejection::JobLevel));
    }

    #[test]
    fn test_duration_cap_is_inclusive() {
        let q = RecommendationQuery::new("x").with_max_duration(30);
        assert_eq!(QueryFilter::from_query(&q).check(&record()), Ok(()));
        let q = RecommendationQuery::new("x").with_max_duration(29);
        assert_eq!(QueryFilter::from_query(&q).check(&record()), Err(Rejection::Duration));
    }

    #[test]
    fn test_unknown_duration_never_rejected() {
        let q = RecommendationQuery::new("x").with_max_duration(0);
        let untimed = record().with_duration("Untimed");
        assert_eq!(QueryFilter::from_query(&q).check(&untimed), Ok(()));
    }

    #[test]
    fn test_language_intersection() {
        let q = RecommendationQuery::new("x").with_languages(["German", "French"]);
        assert_eq!(QueryFilter::from_query(&q).check(&record()), Ok(()));
        let q = RecommendationQuery::new("x").with_languages(["German"]);
        assert_eq!(QueryFilter::from_query(&q).check(&record()), Err(Rejection::Language));
    }

    #[test]
    fn test_test_type_exact_match() {
        let q = RecommendationQuery::new("x").with_test_type("cognitive");
        assert_eq!(QueryFilter::from_query(&q).check(&record()), Err(Rejection::TestType));
        let q = RecommendationQuery::new("x").with_test_type("Cognitive");
        assert_eq!(QueryFilter::from_query(&q).check(&record()), Ok(()));
    }

    #[test]
    fn test_empty_filters_are_unset() {
        let q = RecommendationQuery::new("x")
            .with_job_level("")
            .with_test_type("")
            .with_languages(Vec::<String>::new());
        assert_eq!(QueryFilter::from_query(&q).check(&record()), Ok(()));
    }

    #[test]
    fn test_missing_embedding_rejected() {
        let mut r = record();
        r.embedding = None;
        let q = RecommendationQuery::new("x");
        assert_eq!(QueryFilter::from_query(&q).check(&r), Err(Rejection::NotIndexed));
    }
}
