//! Assessment recommender CLI library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (embed, recommend, benchmark, listings)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    init_logging, list_values, load_settings, render_views, run_benchmark, run_embed,
    run_recommend, show_stats, RecommendArgs,
};
