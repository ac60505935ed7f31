//! Binary crate for service-A, the postal-code gateway.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and loading configuration
//! - Wiring the validator and the weather-service client into the router
//! - Running the HTTP listener

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
