//! Bomb Gomoku server entry point.

mod cli;

use anyhow::Result;
use bomb_gomoku::{logging, server};
use clap::Parser;
use cli::Cli;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Cli::parse().resolve()?;
    logging::init(&config.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "starting bomb-gomoku");
    server::serve(&config).await
}
