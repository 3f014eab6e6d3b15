//! CLI argument parsing for the assessment recommender.
//!
//! CLI flags override every other config source.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Assessment Recommender
///
/// Matches free-text job descriptions against the assessment catalog.
#[derive(Parser, Debug)]
#[command(name = "assessment-recommender")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/assessment-recommender/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override catalog path
    #[arg(long, global = true)]
    pub catalog: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate missing catalog embeddings and persist them
    Embed {
        /// Discard stored vectors and re-encode the whole catalog
        #[arg(short, long)]
        force: bool,

        /// Skip the persistent embedding cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Recommend assessments for a job description
    Recommend {
        /// Free-text query
        query: String,

        /// Required job level, e.g. "Manager"
        #[arg(long)]
        job_level: Option<String>,

        /// Maximum duration in minutes
        #[arg(long)]
        max_duration: Option<u32>,

        /// Accepted language (repeatable)
        #[arg(long = "language")]
        languages: Vec<String>,

        /// Required test type, e.g. "Cognitive"
        #[arg(long)]
        test_type: Option<String>,

        /// Number of results (default from config)
        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Score the recommender against labeled test queries
    Benchmark {
        /// Metric cutoff (default from config)
        #[arg(short)]
        k: Option<usize>,

        /// Test query file (default from config)
        #[arg(long)]
        queries: Option<String>,

        /// Write the JSON report here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List job levels present in the catalog
    JobLevels,

    /// List test types present in the catalog
    TestTypes,

    /// Show catalog and cache statistics
    Stats,
}
