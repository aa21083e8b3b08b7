pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::fetcher::parallel::DEFAULT_WORKERS;

#[derive(Parser)]
#[command(name = "cmt")]
#[command(about = "Offline map tiles and race routes for CMT", long_about = None)]
pub struct Cli {
    /// Number of parallel workers for prefetching routes
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, global = true)]
    pub workers: usize,

    /// Config file to use instead of ~/.config/cmt/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the offline tile package if it is missing
    Tiles,
    /// Fetch a race's route and show it
    Route {
        /// Race identifier, e.g. race-101
        race_id: String,
        /// Print the route as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch the routes of several races
    Prefetch {
        /// Race identifiers
        #[arg(required = true)]
        race_ids: Vec<String>,
    },
    /// Show which artifacts are on disk
    Status {
        /// Race identifiers whose cached routes to report
        race_ids: Vec<String>,
    },
}
