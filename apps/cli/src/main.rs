//! SiteCrawl CLI: polite, same-host crawler for listing-style sites.
//!
//! Walks a site breadth-first from a seed URL and writes the records it
//! extracts as JSON.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
