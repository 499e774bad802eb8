mod config;
mod constants;
mod core_auth;
mod core_cli;
mod core_ftpcommand;
mod core_network;
mod core_tls;
mod server;
mod session;

use crate::config::Config;
use crate::core_cli::Cli;
use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use std::io::Write;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_level = if args.debug { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    // Configuration file first, then command line overrides
    let config = Config::from_cli(&args).context("Failed to load configuration")?;

    server::run(config).await
}
