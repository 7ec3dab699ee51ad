//! Binary crate for the `weather-server` HTTP API.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging set-up
//! - Serving the routes defined in the library half of the crate

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
