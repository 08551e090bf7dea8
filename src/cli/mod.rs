//! CLI argument parsing and entry point.

use crate::dispatcher;
use anyhow::Result;
use clap::Parser;

/// fanout-bench - concurrent streaming load harness for local LLM servers
#[derive(Parser, Debug)]
#[command(name = "fanout-bench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Number of concurrent workers to launch
    #[arg(short = 't', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub num_workers: u16,
}

impl Cli {
    /// Run the harness.
    pub async fn run(&self) -> Result<()> {
        tracing::info!("Starting fanout-bench");
        tracing::info!("Workers: {}", self.num_workers);

        // Multiport stays fixed on: each worker gets its own backend port.
        dispatcher::run(self.num_workers as usize, true).await
    }
}
