//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;

pub use job::RenderArgs;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a render job, follow its progress and download the result
    Render(RenderArgs),
    /// Show the status of a job
    Status {
        /// Job ID
        id: String,
    },
    /// Download the result of a finished job
    Fetch {
        /// Job ID
        id: String,

        /// Output file
        #[arg(short, long, default_value = job::DEFAULT_OUTPUT)]
        out: PathBuf,
    },
    /// Cancel a running job
    Cancel {
        /// Job ID
        id: String,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        Commands::Render(args) => job::render(&client, args).await,
        Commands::Status { id } => job::show_status(&client, &id).await,
        Commands::Fetch { id, out } => job::fetch(&client, &id, &out).await,
        Commands::Cancel { id } => job::cancel(&client, &id).await,
    }
}
