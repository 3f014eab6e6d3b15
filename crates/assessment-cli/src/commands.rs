//! Command implementations for the assessment recommender.
//!
//! Handles:
//! - embed: Fill in catalog embeddings and persist them
//! - recommend: Rank the catalog against a query
//! - benchmark: Evaluate ranking quality on labeled queries
//! - job-levels / test-types / stats: Catalog introspection

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use assessment_catalog::{CatalogError, CatalogStore};
use assessment_embeddings::{encoder_from_settings, EmbeddingCache, EmbeddingModel};
use assessment_eval::{load_test_cases, Benchmark, BenchmarkReport};
use assessment_ranker::{to_views, RecommendationView, Recommender};
use assessment_types::{CatalogField, RecommendationQuery, Settings};

/// Filters and options for one `recommend` invocation.
#[derive(Debug, Clone, Default)]
pub struct RecommendArgs {
    pub query: String,
    pub job_level: Option<String>,
    pub max_duration: Option<u32>,
    pub languages: Vec<String>,
    pub test_type: Option<String>,
    pub top_n: Option<usize>,
    pub json: bool,
}

/// Load settings and apply the global CLI overrides.
pub fn load_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    catalog_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(catalog) = catalog_override {
        settings.catalog_path = catalog.to_string();
    }

    settings.validate().context("Invalid configuration")?;
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over `log_level`.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Build the configured encoder off the async runtime (model load is CPU and IO bound).
async fn load_encoder(settings: &Settings) -> Result<Arc<dyn EmbeddingModel>> {
    let embedding = settings.embedding.clone();
    let encoder = tokio::task::spawn_blocking(move || encoder_from_settings(&embedding))
        .await
        .context("Encoder task failed")?
        .context("Failed to load embedding model")?;

    let info = encoder.info();
    info!(model = %info.name, version = %info.version, dimension = info.dimension, "Encoder ready");
    Ok(Arc::from(encoder))
}

/// Open the persistent embedding cache. Failure downgrades to no cache.
fn open_cache(settings: &Settings) -> Option<EmbeddingCache> {
    let path = settings.embedding_cache_path();
    match EmbeddingCache::open(&path) {
        Ok(cache) => Some(cache),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Embedding cache unavailable, encoding without it");
            None
        }
    }
}

fn load_store(settings: &Settings) -> Result<CatalogStore> {
    let path = settings.catalog_path();
    CatalogStore::load(&path).with_context(|| format!("Failed to load catalog {}", path.display()))
}

/// Load the catalog, embed whatever is missing, and wrap it for ranking.
async fn prepare_recommender(settings: &Settings) -> Result<Recommender> {
    let encoder = load_encoder(settings).await?;
    let mut store = load_store(settings)?;

    if !store.embeddings_generated() {
        let cache = open_cache(settings);
        let model = encoder.clone();
        store = tokio::task::spawn_blocking(move || -> Result<CatalogStore, CatalogError> {
            let report = store.ensure_embeddings(model.as_ref(), cache.as_ref())?;
            info!(
                generated = report.generated,
                cache_hits = report.cache_hits,
                "Catalog embeddings refreshed"
            );
            Ok(store)
        })
        .await
        .context("Embedding task failed")?
        .context("Failed to generate catalog embeddings")?;
    }

    Ok(Recommender::new(Arc::new(store), encoder))
}

/// `embed`: generate and persist missing embeddings.
pub async fn run_embed(settings: &Settings, force: bool, no_cache: bool) -> Result<()> {
    let encoder = load_encoder(settings).await?;
    let mut store = load_store(settings)?;

    if force {
        info!("Discarding stored embeddings");
        store.invalidate_embeddings();
    }

    let cache = if no_cache { None } else { open_cache(settings) };
    let report = tokio::task::spawn_blocking(move || {
        store.ensure_embeddings(encoder.as_ref(), cache.as_ref())
    })
    .await
    .context("Embedding task failed")?
    .context("Failed to generate catalog embeddings")?;

    if report.generated == 0 {
        println!("All assessments already embedded");
    } else {
        println!(
            "Embedded {} assessments ({} from cache)",
            report.generated, report.cache_hits
        );
    }
    Ok(())
}

/// `recommend`: rank the catalog against a query.
pub async fn run_recommend(settings: &Settings, args: RecommendArgs) -> Result<()> {
    let recommender = prepare_recommender(settings).await?;

    let mut query = RecommendationQuery::new(args.query)
        .with_top_n(args.top_n.unwrap_or(settings.default_top_n));
    query.job_level = args.job_level;
    query.max_duration = args.max_duration;
    query.test_type = args.test_type;
    if !args.languages.is_empty() {
        query.languages = Some(args.languages);
    }

    let views = tokio::task::spawn_blocking(move || {
        recommender
            .recommend(&query)
            .map(|results| to_views(&results))
    })
    .await
    .context("Ranking task failed")?
    .context("Ranking failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else {
        println!("{}", render_views(&views));
    }
    Ok(())
}

/// Human-readable listing of recommendations.
pub fn render_views(views: &[RecommendationView]) -> String {
    if views.is_empty() {
        return "No matching assessments".to_string();
    }

    let mut lines = Vec::new();
    for (i, view) in views.iter().enumerate() {
        lines.push(format!(
            "{}. {} ({:.3})",
            i + 1,
            view.name,
            view.similarity
        ));
        lines.push(format!(
            "   type: {}  duration: {} min  remote: {}  adaptive: {}",
            view.test_type.join(", "),
            view.duration,
            view.remote_support,
            view.adaptive_support
        ));
        if !view.url.is_empty() {
            lines.push(format!("   {}", view.url));
        }
    }
    lines.join("\n")
}

/// `benchmark`: evaluate ranking quality.
pub async fn run_benchmark(
    settings: &Settings,
    k: Option<usize>,
    queries_path: Option<&str>,
    out: Option<&Path>,
) -> Result<()> {
    let queries_path = queries_path
        .map(Settings::expand_path)
        .unwrap_or_else(|| settings.test_queries_path());
    let cases = load_test_cases(&queries_path)
        .with_context(|| format!("Failed to load test queries {}", queries_path.display()))?;

    let recommender = prepare_recommender(settings).await?;
    let evaluation = settings.evaluation.clone();
    let k = k.unwrap_or(evaluation.k);

    let report: BenchmarkReport = tokio::task::spawn_blocking(move || {
        Benchmark::new(&recommender, evaluation).run(&cases, k)
    })
    .await
    .context("Benchmark task failed")?
    .context("Benchmark failed")?;

    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", report.render_table());

    if let Some(out) = out {
        if let Some(parent) = out.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(out, &json)
            .with_context(|| format!("Failed to write report {}", out.display()))?;
        println!("\nReport written to {}", out.display());
    } else {
        println!("\n{}", json);
    }

    if report.flagged_queries() > 0 {
        warn!(
            flagged = report.flagged_queries(),
            "Some queries carry diagnostics; see detailed_results"
        );
    }
    Ok(())
}

/// `job-levels` / `test-types`: list unique catalog values.
pub fn list_values(settings: &Settings, field: CatalogField) -> Result<()> {
    let store = load_store(settings)?;
    for value in store.unique_values(field) {
        println!("{}", value);
    }
    Ok(())
}

/// `stats`: catalog and cache summary.
pub fn show_stats(settings: &Settings) -> Result<()> {
    let store = load_store(settings)?;
    let stats = store.stats();

    println!("Catalog: {}", store.path().display());
    println!("  Assessments: {}", stats.total);
    println!("  Embedded: {}", stats.embedded);
    println!(
        "  Dimension: {}",
        stats
            .dimension
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "  Encoder version: {}",
        stats.embedding_version.as_deref().unwrap_or("-")
    );

    let cache_path = settings.embedding_cache_path();
    if cache_path.exists() {
        let cache = EmbeddingCache::open(&cache_path)
            .with_context(|| format!("Failed to open embedding cache {}", cache_path.display()))?;
        println!("Embedding cache: {}", cache_path.display());
        println!("  Entries: {}", cache.count()?);
    } else {
        println!("Embedding cache: none");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(name: &str, url: &str) -> RecommendationView {
        RecommendationView {
            name: name.to_string(),
            url: url.to_string(),
            adaptive_support: "No".to_string(),
            description: String::new(),
            duration: 30,
            remote_support: "Yes".to_string(),
            test_type: vec!["Cognitive".to_string()],
            similarity: 0.5,
        }
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_views(&[]), "No matching assessments");
    }

    #[test]
    fn test_render_views_numbered() {
        let out = render_views(&[view("Verbal", "https://x/verbal"), view("Numerical", "")]);
        assert!(out.starts_with("1. Verbal (0.500)"));
        assert!(out.contains("2. Numerical"));
        assert!(out.contains("https://x/verbal"));
        assert!(out.contains("duration: 30 min"));
    }
}
