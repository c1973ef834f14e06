//! Binary crate for the `weather-proxy` tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Running the HTTP proxy
//! - One-off lookups and interactive configuration

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    weather_proxy::logging::init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
