//! fanout-bench CLI
//!
//! Command-line interface for fanning out concurrent streaming
//! chat-completion requests against a local inference server.

use anyhow::Result;
use clap::Parser;
use fanout_bench::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Console gets debug-level detail; per-worker files stay info-and-above.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let cli = Cli::parse();
    cli.run().await?;

    Ok(())
}
