//! # assessment-eval
//!
//! Offline evaluation of recommendation quality.
//!
//! Labeled test queries are run through the [`assessment_ranker::Recommender`]
//! and scored with precision@k, NDCG@k, reciprocal rank and categorical
//! diversity. Results are averaged into a JSON-serialisable report.

pub mod benchmark;
pub mod cases;
pub mod error;
pub mod metrics;

pub use benchmark::{evaluate_ranking, Benchmark, BenchmarkReport, QueryDiagnostic, QueryResult};
pub use cases::{load_test_cases, sample_test_cases, TestCase};
pub use error::EvalError;
