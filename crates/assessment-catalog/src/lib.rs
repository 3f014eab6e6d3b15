//! # assessment-catalog
//!
//! The catalog store: loads the assessment catalog document, guarantees
//! every served record carries an embedding, and writes enriched catalogs
//! back to disk.

pub mod error;
pub mod store;

pub use error::CatalogError;
pub use store::{CatalogStats, CatalogStore, EmbeddingReport};
