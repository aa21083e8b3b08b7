use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cmt::app::AppContext;
use cmt::cli::{commands, Cli, Commands};
use cmt::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = Arc::new(AppContext::with_workers(config, cli.workers)?);

    match cli.command {
        Commands::Tiles => {
            commands::download_tiles(&ctx).await?;
        }
        Commands::Route { race_id, json } => {
            commands::show_route(&ctx, &race_id, json).await?;
        }
        Commands::Prefetch { race_ids } => {
            commands::prefetch_routes(&ctx, &race_ids).await?;
        }
        Commands::Status { race_ids } => {
            commands::show_status(&ctx, &race_ids)?;
        }
    }

    Ok(())
}
