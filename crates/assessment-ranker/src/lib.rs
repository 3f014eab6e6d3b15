//! # assessment-ranker
//!
//! Ranks catalog assessments against a free-text query.
//!
//! The query is encoded once; every catalog record is checked against the
//! job level, duration, language and test type filters, scored by cosine
//! similarity, and the best `top_n` are returned in descending order.

pub mod error;
pub mod filter;
pub mod ranker;
pub mod similarity;
pub mod view;

pub use error::RankError;
pub use filter::{QueryFilter, Rejection};
pub use ranker::{rank, FilterCounts, Recommender, ScoredAssessment};
pub use similarity::cosine_similarity;
pub use view::{to_views, RecommendationView, MAX_VIEW_RESULTS};
