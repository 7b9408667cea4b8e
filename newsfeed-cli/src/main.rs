//! newsfeed: run the bot on the console. Config from CLI flags, env and `.env`.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use newsfeed_cli::{run, Cli, Commands, RunConfig, UnconfiguredArticles};
use newsfeed_core::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = RunConfig::from_cli(&cli);
    init_tracing(&config.log)?;

    match cli.command {
        Commands::Run(_) => run(config, Arc::new(UnconfiguredArticles)).await,
    }
}
