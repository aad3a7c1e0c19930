//! Lissajous CLI
//!
//! Command-line interface for the Lissajous render service.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "lissajous")]
#[command(about = "Render animated Lissajous curves", long_about = None)]
struct Cli {
    /// Render service URL
    #[arg(
        long,
        env = "LISSAJOUS_SERVER_URL",
        default_value = "http://localhost:8000"
    )]
    server_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
    };

    handle_command(cli.command, &config).await
}
