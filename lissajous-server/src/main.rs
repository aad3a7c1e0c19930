use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use lissajous_runner::{FfmpegEncoder, JobRunner, LissajousFrames};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::service::job_service::JobService;

pub mod api;
pub mod config;
pub mod repository;
pub mod service;
#[cfg(test)]
mod testing;

/// How long shutdown waits for cancelled jobs to clean up
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "lissajous_server=debug,lissajous_runner=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lissajous server...");

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let config = Config::from_env().context("Failed to load configuration")?;

    let runner_config = config.runner_config();
    let encoder = FfmpegEncoder::from_config(&runner_config);
    let encoder_available = encoder.is_available().await;
    if !encoder_available {
        tracing::warn!(
            "ffmpeg not found at {}; render requests will be rejected",
            runner_config.ffmpeg_binary.display()
        );
    }

    let runner = JobRunner::new(Arc::new(LissajousFrames), Arc::new(encoder), runner_config)
        .context("Invalid runner configuration")?;
    let service = JobService::new(runner, encoder_available);

    // Build router with all API endpoints
    let app = api::create_router(service.clone(), &config.static_dir);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(service.clone()))
    .await
    .context("Server error")?;

    if tokio::time::timeout(SHUTDOWN_GRACE, service.wait_for_all())
        .await
        .is_err()
    {
        tracing::warn!("Some jobs did not finish within {:?}", SHUTDOWN_GRACE);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal(service: JobService) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutting down, {} job(s) registered", service.job_count());

    let cancelled = service.cancel_all();
    if cancelled > 0 {
        tracing::info!("Cancelled {} running job(s)", cancelled);
    }
}
