//! # assessment-types
//!
//! Shared domain types for the assessment recommender.
//!
//! - Assessments and the catalog document they live in
//! - Recommendation query context
//! - Settings: layered configuration

pub mod assessment;
pub mod config;
pub mod error;
pub mod query;

pub use assessment::{
    parse_duration, Assessment, AssessmentMeta, Catalog, CatalogField, CatalogMetadata,
    DEFAULT_TEST_TYPE,
};
pub use config::{EmbeddingBackend, EmbeddingSettings, EvaluationSettings, Settings};
pub use error::ConfigError;
pub use query::{RecommendationQuery, DEFAULT_TOP_N};
