//! End-to-end evaluation tests.
//!
//! Runs labeled queries through the full recommender and checks the
//! aggregated report, diagnostics and JSON output.

use pretty_assertions::assert_eq;

use assessment_eval::{
    load_test_cases, sample_test_cases, Benchmark, EvalError, QueryDiagnostic, TestCase,
};
use assessment_types::EvaluationSettings;
use e2e_tests::{hash_encoder, TestHarness};

const EPS: f64 = 1e-9;

#[test]
fn test_benchmark_scores_labeled_queries() {
    let harness = TestHarness::new();
    let recommender = harness.recommender(hash_encoder());
    let bench = Benchmark::new(&recommender, EvaluationSettings::default());

    let cases = vec![
        TestCase::new("java concurrency collections", ["Java 8 Programming"]),
        TestCase::new(
            "sales manager coaching team performance",
            ["Agency Manager Solution"],
        ),
    ];

    let report = bench.run(&cases, 3).unwrap();
    assert_eq!(report.k, 3);
    assert_eq!(report.retrieval_depth, 10);
    assert_eq!(report.detailed_results.len(), 2);
    assert!((report.avg_mrr - 1.0).abs() < EPS);
    // One relevant item per query among three returned.
    assert!((report.avg_precision_at_k - 1.0 / 3.0).abs() < EPS);
    assert!((report.avg_ndcg_at_k - 1.0).abs() < EPS);
    assert_eq!(report.flagged_queries(), 0);

    for result in &report.detailed_results {
        assert_eq!(result.top_recommendations.len(), 3);
        assert!(result.diversity_test_types > 0.0 && result.diversity_test_types <= 1.0);
    }
}

#[test]
fn test_sample_queries_flag_empty_rankings() {
    let harness = TestHarness::new();
    let recommender = harness.recommender(hash_encoder());
    let bench = Benchmark::new(&recommender, EvaluationSettings::default());

    // The built-in samples filter on a lowercase "english" that no
    // fixture record lists, so both rank nothing.
    let report = bench.run_default(&sample_test_cases()).unwrap();
    assert_eq!(report.k, 5);
    assert_eq!(report.flagged_queries(), 2);
    assert_eq!(report.avg_precision_at_k, 0.0);
    assert_eq!(report.avg_mrr, 0.0);
    for result in &report.detailed_results {
        assert_eq!(result.diagnostics, vec![QueryDiagnostic::EmptyRanking]);
    }
}

#[test]
fn test_unknown_ground_truth_is_reported() {
    let harness = TestHarness::new();
    let recommender = harness.recommender(hash_encoder());
    let bench = Benchmark::new(&recommender, EvaluationSettings::default());

    let cases = vec![TestCase::new(
        "python scripting",
        ["Python Programming", "Discontinued Assessment"],
    )];
    let report = bench.run(&cases, 5).unwrap();
    let result = &report.detailed_results[0];
    assert_eq!(
        result.diagnostics,
        vec![QueryDiagnostic::UnknownGroundTruth {
            missing: vec!["Discontinued Assessment".to_string()]
        }]
    );
    assert_eq!(result.top_recommendations[0], "Python Programming");
    assert!((result.mrr - 1.0).abs() < EPS);
}

#[test]
fn test_empty_case_set_is_error() {
    let harness = TestHarness::new();
    let recommender = harness.recommender(hash_encoder());
    let bench = Benchmark::new(&recommender, EvaluationSettings::default());
    assert!(matches!(bench.run(&[], 5), Err(EvalError::NoTestCases)));
}

#[test]
fn test_queries_file_round_trip_through_report_json() {
    let harness = TestHarness::new();
    let recommender = harness.recommender(hash_encoder());

    let queries_path = harness._temp_dir.path().join("test_queries.json");
    std::fs::write(
        &queries_path,
        r#"[
            {
                "query": "personality at work",
                "relevant_assessments": ["Occupational Personality Questionnaire"],
                "test_type": "Personality"
            }
        ]"#,
    )
    .unwrap();

    let cases = load_test_cases(&queries_path).unwrap();
    let bench = Benchmark::new(&recommender, EvaluationSettings::default());
    let report = bench.run(&cases, 5).unwrap();

    let result = &report.detailed_results[0];
    // Only two Personality records exist, so k shrinks to 2.
    assert_eq!(result.top_recommendations.len(), 2);
    assert!((result.precision_at_k - 0.5).abs() < EPS);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["k"], 5);
    assert!(json["generated_at"].is_string());
    assert_eq!(json["detailed_results"].as_array().map(Vec::len), Some(1));
    assert!(json["detailed_results"][0].get("diagnostics").is_none());
}
