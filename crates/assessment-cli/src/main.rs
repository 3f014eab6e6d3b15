//! Assessment Recommender
//!
//! Recommends catalog assessments for free-text job descriptions.
//!
//! # Usage
//!
//! ```bash
//! assessment-recommender embed [--force] [--no-cache]
//! assessment-recommender recommend "java developer" [--job-level LEVEL] [--max-duration MIN] [-n N]
//! assessment-recommender benchmark [-k K] [--queries PATH] [--out PATH]
//! assessment-recommender job-levels | test-types | stats
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/assessment-recommender/config.toml)
//! 3. Environment variables (ASSESSMENT_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use assessment_cli::{
    init_logging, list_values, load_settings, run_benchmark, run_embed, run_recommend,
    show_stats, Cli, Commands, RecommendArgs,
};
use assessment_types::CatalogField;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(
        cli.config.as_deref(),
        cli.log_level.as_deref(),
        cli.catalog.as_deref(),
    )?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Embed { force, no_cache } => {
            run_embed(&settings, force, no_cache).await?;
        }
        Commands::Recommend {
            query,
            job_level,
            max_duration,
            languages,
            test_type,
            top_n,
            json,
        } => {
            let args = RecommendArgs {
                query,
                job_level,
                max_duration,
                languages,
                test_type,
                top_n,
                json,
            };
            run_recommend(&settings, args).await?;
        }
        Commands::Benchmark { k, queries, out } => {
            run_benchmark(&settings, k, queries.as_deref(), out.as_deref()).await?;
        }
        Commands::JobLevels => {
            list_values(&settings, CatalogField::JobLevels)?;
        }
        Commands::TestTypes => {
            list_values(&settings, CatalogField::TestType)?;
        }
        Commands::Stats => {
            show_stats(&settings)?;
        }
    }

    Ok(())
}
