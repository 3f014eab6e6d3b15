//! Offline benchmark over labeled test queries.
//!
//! Each case is ranked with a retrieval depth at least as deep as `k`, scored
//! against binary relevance over the whole catalog, and the per-query
//! metrics are averaged into a [`BenchmarkReport`].

use std::collections::{HashMap, HashSet};

use assessment_ranker::{Recommender, ScoredAssessment};
use assessment_types::{Assessment, CatalogField, EvaluationSettings};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cases::TestCase;
use crate::error::EvalError;
use crate::metrics::{diversity_score, mean, ndcg_at_k, precision_at_k, reciprocal_rank};

/// Something about a query that makes its scores less meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryDiagnostic {
    /// Ground-truth names with no record in the catalog
    UnknownGroundTruth { missing: Vec<String> },
    /// The ranker returned nothing; every metric is 0.0
    EmptyRanking,
}

/// Metrics for a single test query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub query: String,
    pub precision_at_k: f64,
    pub ndcg_at_k: f64,
    pub mrr: f64,
    pub diversity_job_levels: f64,
    pub diversity_test_types: f64,
    /// Names of the top-k recommendations
    pub top_recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<QueryDiagnostic>,
}

/// Averages across every query plus the per-query breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub k: usize,
    pub retrieval_depth: usize,
    pub generated_at: String,
    pub avg_precision_at_k: f64,
    pub avg_ndcg_at_k: f64,
    pub avg_mrr: f64,
    pub avg_diversity_job_levels: f64,
    pub avg_diversity_test_types: f64,
    pub detailed_results: Vec<QueryResult>,
}

impl BenchmarkReport {
    /// Average the per-query results. Fails on an empty set.
    pub fn from_results(
        k: usize,
        retrieval_depth: usize,
        results: Vec<QueryResult>,
    ) -> Result<Self, EvalError> {
        let avg = |f: fn(&QueryResult) -> f64| -> Result<f64, EvalError> {
            let values: Vec<f64> = results.iter().map(f).collect();
            mean(&values).ok_or(EvalError::NoTestCases)
        };

        Ok(Self {
            k,
            retrieval_depth,
            generated_at: chrono::Utc::now().to_rfc3339(),
            avg_precision_at_k: avg(|r| r.precision_at_k)?,
            avg_ndcg_at_k: avg(|r| r.ndcg_at_k)?,
            avg_mrr: avg(|r| r.mrr)?,
            avg_diversity_job_levels: avg(|r| r.diversity_job_levels)?,
            avg_diversity_test_types: avg(|r| r.diversity_test_types)?,
            detailed_results: results,
        })
    }

    /// Number of queries that carried at least one diagnostic.
    pub fn flagged_queries(&self) -> usize {
        self.detailed_results
            .iter()
            .filter(|r| !r.diagnostics.is_empty())
            .count()
    }

    /// Tab-separated summary for terminals.
    pub fn render_table(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "Benchmark Results (k={}, depth={}, queries={})",
            self.k,
            self.retrieval_depth,
            self.detailed_results.len()
        ));
        lines.push("query\tprecision\tndcg\tmrr\tdiv_levels\tdiv_types".to_string());

        for r in &self.detailed_results {
            let mut label: String = r.query.chars().take(30).collect();
            if label.len() < r.query.len() {
                label.push_str("...");
            }
            if !r.diagnostics.is_empty() {
                label.push_str(" (!)");
            }
            lines.push(format!(
                "{}\t{:.3}\t{:.3}\t{:.3}\t{:.3}\t{:.3}",
                label,
                r.precision_at_k,
                r.ndcg_at_k,
                r.mrr,
                r.diversity_job_levels,
                r.diversity_test_types
            ));
        }

        lines.push(format!(
            "average\t{:.3}\t{:.3}\t{:.3}\t{:.3}\t{:.3}",
            self.avg_precision_at_k,
            self.avg_ndcg_at_k,
            self.avg_mrr,
            self.avg_diversity_job_levels,
            self.avg_diversity_test_types
        ));
        lines.join("\n")
    }
}

/// Score one ranked list against a test case.
///
/// `catalog` is the full record list the ranking indexes into and
/// `name_index` maps each name to its first catalog position.
pub fn evaluate_ranking(
    catalog: &[Assessment],
    name_index: &HashMap<&str, usize>,
    case: &TestCase,
    ranked: &[ScoredAssessment<'_>],
    k: usize,
) -> QueryResult {
    let mut diagnostics = Vec::new();

    let missing: Vec<String> = case
        .relevant_assessments
        .iter()
        .filter(|name| !name_index.contains_key(name.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        warn!(
            query = %case.query,
            missing = ?missing,
            "Ground-truth assessments not found in catalog"
        );
        diagnostics.push(QueryDiagnostic::UnknownGroundTruth { missing });
    }

    let top_k: Vec<&Assessment> = ranked.iter().take(k).map(|s| s.assessment).collect();
    let top_recommendations = top_k.iter().map(|a| a.name.clone()).collect();

    if ranked.is_empty() {
        warn!(query = %case.query, "Ranking returned no candidates");
        diagnostics.push(QueryDiagnostic::EmptyRanking);
        return QueryResult {
            query: case.query.clone(),
            precision_at_k: 0.0,
            ndcg_at_k: 0.0,
            mrr: 0.0,
            diversity_job_levels: 0.0,
            diversity_test_types: 0.0,
            top_recommendations,
            diagnostics,
        };
    }

    let relevant: HashSet<&str> = case
        .relevant_assessments
        .iter()
        .map(String::as_str)
        .collect();
    let relevance: Vec<bool> = catalog
        .iter()
        .map(|a| relevant.contains(a.name.as_str()))
        .collect();
    let ranked_indices: Vec<usize> = ranked.iter().map(|s| s.index).collect();

    QueryResult {
        query: case.query.clone(),
        precision_at_k: precision_at_k(&relevance, &ranked_indices, k),
        ndcg_at_k: ndcg_at_k(&relevance, &ranked_indices, k),
        mrr: reciprocal_rank(&relevance, &ranked_indices),
        diversity_job_levels: diversity_score(&top_k, CatalogField::JobLevels),
        diversity_test_types: diversity_score(&top_k, CatalogField::TestType),
        top_recommendations,
        diagnostics,
    }
}

/// Runs labeled test queries through a [`Recommender`].
pub struct Benchmark<'r> {
    recommender: &'r Recommender,
    settings: EvaluationSettings,
}

impl<'r> Benchmark<'r> {
    pub fn new(recommender: &'r Recommender, settings: EvaluationSettings) -> Self {
        Self {
            recommender,
            settings,
        }
    }

    /// Candidates requested per query for cutoff `k`.
    pub fn retrieval_depth(&self, k: usize) -> usize {
        self.settings.retrieval_depth.max(k)
    }

    /// Run every case with the configured cutoff.
    pub fn run_default(&self, cases: &[TestCase]) -> Result<BenchmarkReport, EvalError> {
        self.run(cases, self.settings.k)
    }

    /// Run every case and average the metrics at cutoff `k`.
    pub fn run(&self, cases: &[TestCase], k: usize) -> Result<BenchmarkReport, EvalError> {
        if cases.is_empty() {
            return Err(EvalError::NoTestCases);
        }
        if k == 0 {
            return Err(EvalError::InvalidConfig("k must be > 0".to_string()));
        }

        let depth = self.retrieval_depth(k);
        let store = self.recommender.store();
        let name_index = store.name_index();

        info!(cases = cases.len(), k, depth, "Running benchmark");

        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            let ranked = self.recommender.recommend(&case.to_query(depth))?;
            let result = evaluate_ranking(store.assessments(), &name_index, case, &ranked, k);
            debug!(
                query = %result.query,
                precision = result.precision_at_k,
                ndcg = result.ndcg_at_k,
                mrr = result.mrr,
                "Evaluated query"
            );
            results.push(result);
        }

        let report = BenchmarkReport::from_results(k, depth, results)?;
        info!(
            avg_precision = report.avg_precision_at_k,
            avg_ndcg = report.avg_ndcg_at_k,
            avg_mrr = report.avg_mrr,
            flagged = report.flagged_queries(),
            "Benchmark complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn catalog() -> Vec<Assessment> {
        vec![
            Assessment::new("Verbal Reasoning", "")
                .with_test_type("cognitive")
                .with_job_levels(["Graduate"]),
            Assessment::new("Numerical Reasoning", "")
                .with_test_type("cognitive")
                .with_job_levels(["Graduate", "Manager"]),
            Assessment::new("Leadership Assessment", "")
                .with_test_type("behavioral")
                .with_job_levels(["Director"]),
        ]
    }

    fn index(catalog: &[Assessment]) -> HashMap<&str, usize> {
        catalog
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.as_str(), i))
            .collect()
    }

    fn scored<'a>(catalog: &'a [Assessment], order: &[usize]) -> Vec<ScoredAssessment<'a>> {
        order
            .iter()
            .enumerate()
            .map(|(rank, &i)| ScoredAssessment {
                assessment: &catalog[i],
                index: i,
                similarity: 1.0 - rank as f32 * 0.1,
            })
            .collect()
    }

    #[test]
    fn test_evaluate_scenario() {
        let catalog = catalog();
        let names = index(&catalog);
        let ranked = scored(&catalog, &[1, 0, 2]);
        let case = TestCase::new("verbal", ["Verbal Reasoning"]);

        let at1 = evaluate_ranking(&catalog, &names, &case, &ranked, 1);
        assert_eq!(at1.precision_at_k, 0.0);
        assert_eq!(at1.top_recommendations, vec!["Numerical Reasoning"]);

        let at3 = evaluate_ranking(&catalog, &names, &case, &ranked, 3);
        assert!((at3.precision_at_k - 1.0 / 3.0).abs() < EPS);
        assert!((at3.mrr - 0.5).abs() < EPS);
        assert!((at3.ndcg_at_k - 1.0 / 3f64.log2()).abs() < EPS);
        // {cognitive, behavioral} over 3; {Graduate, Manager, Director} over 3
        assert!((at3.diversity_test_types - 2.0 / 3.0).abs() < EPS);
        assert!((at3.diversity_job_levels - 1.0).abs() < EPS);
        assert!(at3.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_ground_truth_diagnostic() {
        let catalog = catalog();
        let names = index(&catalog);
        let ranked = scored(&catalog, &[0, 1]);
        let case = TestCase::new("q", ["Verbal Reasoning", "Retired Test"]);

        let result = evaluate_ranking(&catalog, &names, &case, &ranked, 2);
        assert_eq!(
            result.diagnostics,
            vec![QueryDiagnostic::UnknownGroundTruth {
                missing: vec!["Retired Test".to_string()]
            }]
        );
        // The known name still scores.
        assert_eq!(result.mrr, 1.0);
    }

    #[test]
    fn test_empty_ranking_diagnostic() {
        let catalog = catalog();
        let names = index(&catalog);
        let case = TestCase::new("q", ["Verbal Reasoning"]);

        let result = evaluate_ranking(&catalog, &names, &case, &[], 5);
        assert_eq!(result.diagnostics, vec![QueryDiagnostic::EmptyRanking]);
        assert_eq!(result.precision_at_k, 0.0);
        assert_eq!(result.ndcg_at_k, 0.0);
        assert_eq!(result.mrr, 0.0);
        assert!(result.top_recommendations.is_empty());
    }

    #[test]
    fn test_report_averages() {
        let catalog = catalog();
        let names = index(&catalog);
        let case = TestCase::new("q", ["Verbal Reasoning"]);
        let hit = evaluate_ranking(&catalog, &names, &case, &scored(&catalog, &[0]), 1);
        let miss = evaluate_ranking(&catalog, &names, &case, &[], 1);

        let report = BenchmarkReport::from_results(1, 10, vec![hit, miss]).unwrap();
        assert!((report.avg_precision_at_k - 0.5).abs() < EPS);
        assert!((report.avg_mrr - 0.5).abs() < EPS);
        assert_eq!(report.flagged_queries(), 1);
        assert!(report.render_table().contains("average"));
    }

    #[test]
    fn test_report_requires_results() {
        assert!(matches!(
            BenchmarkReport::from_results(5, 10, Vec::new()),
            Err(EvalError::NoTestCases)
        ));
    }

    #[test]
    fn test_diagnostics_serialize_tagged() {
        let d = QueryDiagnostic::UnknownGroundTruth {
            missing: vec!["X".to_string()],
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "unknown_ground_truth");
        assert_eq!(json["missing"][0], "X");
    }

    fn hashed_recommender() -> Recommender {
        use assessment_catalog::CatalogStore;
        use assessment_embeddings::{EmbeddingModel, HashEmbedder};
        use assessment_types::Catalog;
        use std::sync::Arc;

        let encoder = Arc::new(HashEmbedder::new(64));
        let assessments = [
            ("Java Programming", "java coding knowledge"),
            ("Verbal Reasoning", "verbal comprehension of written passages"),
            ("Sales Manager Solution", "sales leadership and team management"),
        ]
        .into_iter()
        .map(|(name, desc)| {
            let a = Assessment::new(name, desc);
            let v = encoder.embed(&a.embedding_text()).unwrap().into_vec();
            a.with_embedding(v)
        })
        .collect();
        let store = CatalogStore::from_catalog("unused.json", Catalog::new(assessments));
        Recommender::new(Arc::new(store), encoder)
    }

    #[test]
    fn test_run_rejects_empty_cases_and_zero_k() {
        let recommender = hashed_recommender();
        let bench = Benchmark::new(&recommender, EvaluationSettings::default());
        assert!(matches!(bench.run(&[], 5), Err(EvalError::NoTestCases)));
        let cases = [TestCase::new("java", ["Java Programming"])];
        assert!(matches!(bench.run(&cases, 0), Err(EvalError::InvalidConfig(_))));
    }

    #[test]
    fn test_run_scores_hashed_catalog() {
        let recommender = hashed_recommender();
        let bench = Benchmark::new(&recommender, EvaluationSettings::default());
        let cases = [
            TestCase::new("java coding", ["Java Programming"]),
            TestCase::new("sales leadership", ["Sales Manager Solution"]),
        ];

        let report = bench.run(&cases, 1).unwrap();
        assert_eq!(report.detailed_results.len(), 2);
        assert_eq!(report.retrieval_depth, 10);
        assert_eq!(report.avg_precision_at_k, 1.0);
        assert_eq!(report.avg_mrr, 1.0);
        assert_eq!(report.flagged_queries(), 0);
    }

    #[test]
    fn test_retrieval_depth_never_below_k() {
        let recommender = hashed_recommender();
        let settings = EvaluationSettings {
            k: 5,
            retrieval_depth: 3,
        };
        let bench = Benchmark::new(&recommender, settings);
        assert_eq!(bench.retrieval_depth(5), 5);
        assert_eq!(bench.retrieval_depth(2), 3);
    }
}
