//! Execution service
//!
//! Drives one render job from parameters to encoded animation:
//! - Rendering each frame with fresh random waveform parameters
//! - Staging frames as numbered PNG files
//! - Reporting progress without ever blocking on readers
//! - Running the encoder over the staged frames
//!
//! Every outcome, including panics and cancellation, ends in exactly one
//! terminal status on the job record.

use std::any::Any;
use std::sync::Arc;

use lissajous_core::domain::job::{JobId, Progress};
use lissajous_core::domain::shape::{ShapeParams, Waveform};
use rand::RngCore;
use rand::rngs::OsRng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::{ConfigError, RunnerConfig};
use crate::encoder::{EncodeRequest, Encoder};
use crate::error::RunnerError;
use crate::frame::{FrameSource, encode_png};
use crate::record::{CompletionGuard, JobTicket, ProgressReporter};
use crate::staging::StagingArea;

/// Runs render jobs
///
/// Cheap to clone; clones share the frame source and encoder.
#[derive(Clone)]
pub struct JobRunner {
    frames: Arc<dyn FrameSource>,
    encoder: Arc<dyn Encoder>,
    config: RunnerConfig,
}

impl JobRunner {
    /// Creates a runner, rejecting configurations it cannot run with
    pub fn new(
        frames: Arc<dyn FrameSource>,
        encoder: Arc<dyn Encoder>,
        config: RunnerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            frames,
            encoder,
            config,
        })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Starts the job on its own task
    pub fn spawn(&self, ticket: JobTicket, params: ShapeParams) -> JoinHandle<()> {
        let runner = self.clone();
        let span = info_span!("job", id = %ticket.job_id());
        tokio::spawn(async move { runner.run(ticket, params).await }.instrument(span))
    }

    /// Runs the job to completion and records its outcome
    pub async fn run(&self, ticket: JobTicket, params: ShapeParams) {
        let (record, reporter) = ticket.into_parts();
        let job_id = record.id();
        let _guard = CompletionGuard::new(record.clone());

        let runner = self.clone();
        let cancel = record.cancellation_token().clone();
        let body = tokio::spawn(
            async move { runner.execute(job_id, params, reporter, cancel).await }.in_current_span(),
        );

        let outcome = match body.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(RunnerError::Panicked(panic_message(e.into_panic()))),
            Err(_) => Err(RunnerError::Cancelled),
        };

        match outcome {
            Ok(bytes) => {
                info!("Job {} completed ({} bytes)", job_id, bytes.len());
                record.complete(bytes);
            }
            Err(e) if e.is_cancelled() => {
                info!("Job {} was cancelled", job_id);
                record.fail(e.into());
            }
            Err(e) => {
                warn!("Job {} failed: {}", job_id, e);
                record.fail(e.into());
            }
        }
    }

    async fn execute(
        &self,
        job_id: JobId,
        params: ShapeParams,
        reporter: ProgressReporter,
        cancel: CancellationToken,
    ) -> Result<Vec<u8>, RunnerError> {
        params.validate()?;

        let total = params.frame_count();
        let interval = self.config.progress_interval;
        info!(
            "Starting job {}: {} frames at {} fps",
            job_id, total, params.fps
        );

        let staging =
            StagingArea::create(&self.config.staging_root).map_err(RunnerError::Staging)?;
        let params = Arc::new(params);

        for index in 0..total {
            if cancel.is_cancelled() {
                return Err(RunnerError::Cancelled);
            }

            let wave = random_waveform()?;
            let png = self.render_frame(&params, index, wave).await?;
            staging
                .write_frame(index, &png)
                .await
                .map_err(RunnerError::Staging)?;

            debug!("Staged frame {}/{} for job {}", index + 1, total, job_id);

            let rendered = index + 1;
            if rendered % interval == 0 {
                if cancel.is_cancelled() {
                    return Err(RunnerError::Cancelled);
                }
                reporter.report(Progress::Rendering {
                    frame: rendered,
                    total,
                });
            }
        }

        reporter.report(Progress::Encoding);
        info!("Encoding {} frames for job {}", total, job_id);

        let input_pattern = staging.input_pattern();
        let bytes = self
            .encoder
            .encode(
                EncodeRequest {
                    input_pattern: &input_pattern,
                    fps: params.fps,
                },
                &cancel,
            )
            .await?;

        if let Err(e) = staging.close() {
            warn!("Failed to remove staging directory for job {}: {}", job_id, e);
        }

        Ok(bytes)
    }

    async fn render_frame(
        &self,
        params: &Arc<ShapeParams>,
        index: u32,
        wave: Waveform,
    ) -> Result<Vec<u8>, RunnerError> {
        let frames = self.frames.clone();
        let params = params.clone();

        tokio::task::spawn_blocking(move || encode_png(&frames.render(&params, index, wave)))
            .await
            .map_err(|e| RunnerError::Frame {
                index,
                message: e.to_string(),
            })?
            .map_err(|e| RunnerError::Frame {
                index,
                message: e.to_string(),
            })
    }
}

fn random_waveform() -> Result<Waveform, RunnerError> {
    let mut bytes = [0u8; 2];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(Waveform::from_bytes(bytes))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
