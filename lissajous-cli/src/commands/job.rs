//! Job command handlers
//!
//! Submitting renders, following their progress, downloading results and
//! cancelling jobs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::*;
use lissajous_client::LissajousClient;
use lissajous_core::domain::job::JobId;
use lissajous_core::dto::job::{JobStatusView, RenderForm};

pub const DEFAULT_OUTPUT: &str = "waveform.webp";

/// Arguments of the `render` command
///
/// Unset shape options use the server defaults.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Number of sin(t) periods plotted per frame
    #[arg(long)]
    pub cycles: Option<f64>,

    /// Step between consecutive samples
    #[arg(long)]
    pub res: Option<f64>,

    /// Half the canvas side, in pixels
    #[arg(long)]
    pub size: Option<u32>,

    /// Frames per second (1-200); animations last five seconds
    #[arg(long)]
    pub frames: Option<u32>,

    /// Background color (#RRGGBB, #RRGGBBAA or "random")
    #[arg(long)]
    pub bg: Option<String>,

    /// Foreground color (#RRGGBB, #RRGGBBAA or "random")
    #[arg(long)]
    pub fg: Option<String>,

    /// Output file
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub out: PathBuf,

    /// Milliseconds between status polls
    #[arg(long, default_value_t = 500)]
    pub poll_ms: u64,

    /// Print the job ID and exit without waiting
    #[arg(long)]
    pub detach: bool,
}

impl RenderArgs {
    pub fn to_form(&self) -> RenderForm {
        RenderForm {
            cycles: self.cycles.map(|v| v.to_string()),
            res: self.res.map(|v| v.to_string()),
            size: self.size.map(|v| v.to_string()),
            frames: self.frames.map(|v| v.to_string()),
            bg_color: self.bg.clone(),
            fg_color: self.fg.clone(),
        }
    }
}

/// Submit a job, follow it and save the result
pub async fn render(client: &LissajousClient, args: RenderArgs) -> Result<()> {
    let submitted = client.submit(&args.to_form()).await?;
    let id = submitted.job_id;

    println!("{} {}", "Job started:".green().bold(), id.to_string().cyan());

    if args.detach {
        return Ok(());
    }

    let poll_interval = Duration::from_millis(args.poll_ms.max(10));
    let mut last_status = String::new();

    loop {
        let view = client.status(id).await?;

        if view.status != last_status {
            println!("  {}", format_status(&view));
            last_status = view.status.clone();
        }

        if view.is_complete() {
            break;
        }
        if view.is_error() {
            bail!(
                "Job {} failed: {}",
                id,
                view.error.as_deref().unwrap_or("unknown error")
            );
        }

        tokio::time::sleep(poll_interval).await;
    }

    save_result(client, id, &args.out).await
}

/// Show the status of a job
pub async fn show_status(client: &LissajousClient, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let view = client.status(id).await?;

    println!("{} {}", "Job:".bold(), id.to_string().cyan());
    println!("{} {}", "Status:".bold(), format_status(&view));

    Ok(())
}

/// Download the result of a finished job
pub async fn fetch(client: &LissajousClient, id: &str, out: &Path) -> Result<()> {
    let id = parse_id(id)?;
    save_result(client, id, out).await
}

/// Cancel a running job
pub async fn cancel(client: &LissajousClient, id: &str) -> Result<()> {
    let id = parse_id(id)?;

    match client.cancel(id).await {
        Ok(()) => {
            println!("{} {}", "Cancellation requested:".yellow().bold(), id);
            Ok(())
        }
        Err(e) if e.is_conflict() => {
            println!("{}", format!("Job {} has already finished.", id).yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn save_result(client: &LissajousClient, id: JobId, out: &Path) -> Result<()> {
    let bytes = client.fetch_result(id).await.map_err(|e| {
        if e.is_not_found() {
            anyhow::anyhow!("Job {} not found or its result was already downloaded", id)
        } else {
            e.into()
        }
    })?;

    tokio::fs::write(out, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;

    println!(
        "{} {} ({} bytes)",
        "Saved".green().bold(),
        out.display(),
        bytes.len()
    );

    Ok(())
}

fn parse_id(id: &str) -> Result<JobId> {
    id.trim()
        .parse()
        .with_context(|| format!("Invalid job ID: {}", id))
}

/// Colorized one-line rendering of a job status
fn format_status(view: &JobStatusView) -> String {
    if view.is_complete() {
        view.status.green().to_string()
    } else if view.is_error() {
        match &view.error {
            Some(msg) => format!("{}: {}", view.status.red(), msg),
            None => view.status.red().to_string(),
        }
    } else {
        view.status.yellow().to_string()
    }
}
