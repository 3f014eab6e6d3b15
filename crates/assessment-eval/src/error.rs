//! Evaluation error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    /// Averages over zero test cases are undefined
    #[error("No test cases to evaluate")]
    NoTestCases,

    #[error("Invalid benchmark configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed test queries {}: {source}", path.display())]
    MalformedQueries {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ranking failed: {0}")]
    Rank(#[from] assessment_ranker::RankError),
}
