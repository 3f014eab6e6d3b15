//! Assessment and catalog types.
//!
//! An assessment is one item in the vendor catalog. The catalog document is
//! the flat JSON file produced by the scraper and enriched with embeddings.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Default test type for records scraped without one.
pub const DEFAULT_TEST_TYPE: &str = "General Assessment";

/// Scrape provenance attached to a single record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentMeta {
    #[serde(default)]
    pub scrape_time: Option<String>,
    #[serde(default)]
    pub scraper_user: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single catalog assessment.
///
/// The embedding is derived from `name + " " + description` and must be
/// recomputed whenever either field changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Display name, also the identifier used by evaluation ground truth
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,

    /// Catalog page URL
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    /// Job levels the assessment targets (e.g. "Manager", "Entry-Level")
    #[serde(default, deserialize_with = "null_as_default")]
    pub job_levels: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<String>,

    /// Free-text duration, e.g. "Approximate Completion Time in minutes = 30"
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub remote_testing_support: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub adaptive_irt_support: bool,

    #[serde(default)]
    pub pdf_link: Option<String>,

    /// Cognitive / Personality / Skill / General
    #[serde(default = "default_test_type", deserialize_with = "null_as_test_type")]
    pub test_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AssessmentMeta>,

    /// Semantic vector, present once the catalog has been embedded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Keys this type does not model, written back unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_test_type() -> String {
    DEFAULT_TEST_TYPE.to_string()
}

/// The scraper writes `null` for fields it could not extract.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_test_type<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_test_type))
}

impl Assessment {
    /// Create an assessment with the given name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: String::new(),
            description: description.into(),
            job_levels: Vec::new(),
            languages: Vec::new(),
            duration: String::new(),
            remote_testing_support: false,
            adaptive_irt_support: false,
            pdf_link: None,
            test_type: default_test_type(),
            metadata: None,
            embedding: None,
            extra: Map::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_job_levels<I, S>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.job_levels = levels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    pub fn with_test_type(mut self, test_type: impl Into<String>) -> Self {
        self.test_type = test_type.into();
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Text fed to the encoder for this record.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.name, self.description)
    }

    /// Duration in minutes, 0 when the field carries no digits.
    pub fn duration_minutes(&self) -> u32 {
        parse_duration(&self.duration)
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

/// Categorical fields that can be enumerated across the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogField {
    JobLevels,
    Languages,
    TestType,
}

impl CatalogField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogField::JobLevels => "job_levels",
            CatalogField::Languages => "languages",
            CatalogField::TestType => "test_type",
        }
    }

    /// Every value this field holds on `assessment`; list fields yield each element.
    pub fn values<'a>(&self, assessment: &'a Assessment) -> Vec<&'a str> {
        match self {
            CatalogField::JobLevels => assessment.job_levels.iter().map(String::as_str).collect(),
            CatalogField::Languages => assessment.languages.iter().map(String::as_str).collect(),
            CatalogField::TestType => vec![assessment.test_type.as_str()],
        }
    }
}

/// Extract the first run of ASCII digits from a free-text duration.
///
/// Returns 0 when there are no digits or the run overflows `u32`; such
/// records are treated as short rather than rejected.
pub fn parse_duration(text: &str) -> u32 {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Catalog-level scrape metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraper_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_assessments: Option<usize>,
    /// Version tag of the encoder that produced the stored embeddings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_version: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The persisted catalog document.
///
/// A document without an `assessments` key deserializes as an empty catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub metadata: CatalogMetadata,

    #[serde(default)]
    pub assessments: Vec<Assessment>,

    /// True iff every assessment carries an embedding
    #[serde(default)]
    pub embeddings: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Catalog {
    pub fn new(assessments: Vec<Assessment>) -> Self {
        let mut catalog = Self {
            metadata: CatalogMetadata {
                total_assessments: Some(assessments.len()),
                ..Default::default()
            },
            assessments,
            embeddings: false,
            extra: Map::new(),
        };
        catalog.refresh_embeddings_flag();
        catalog
    }

    pub fn len(&self) -> usize {
        self.assessments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assessments.is_empty()
    }

    /// Recompute the `embeddings` flag from the records.
    pub fn refresh_embeddings_flag(&mut self) {
        self.embeddings = self.assessments.iter().all(Assessment::has_embedding);
    }

    /// Number of records still lacking an embedding.
    pub fn missing_embeddings(&self) -> usize {
        self.assessments.iter().filter(|a| !a.has_embedding()).count()
    }
}
