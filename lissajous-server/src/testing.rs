//! Shared fixtures for server tests

use std::sync::Arc;

use async_trait::async_trait;
use lissajous_runner::{
    EncodeError, EncodeRequest, Encoder, JobRunner, LissajousFrames, RunnerConfig,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::service::job_service::JobService;

pub const FAKE_WEBP: &[u8] = b"RIFF\x0c\0\0\0WEBPVP8L";

/// Returns fixed bytes without running ffmpeg
pub struct FakeEncoder;

#[async_trait]
impl Encoder for FakeEncoder {
    async fn encode(
        &self,
        _request: EncodeRequest<'_>,
        _cancel: &CancellationToken,
    ) -> Result<Vec<u8>, EncodeError> {
        Ok(FAKE_WEBP.to_vec())
    }
}

/// Never finishes unless the job is cancelled
pub struct BlockingEncoder;

#[async_trait]
impl Encoder for BlockingEncoder {
    async fn encode(
        &self,
        _request: EncodeRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, EncodeError> {
        cancel.cancelled().await;
        Err(EncodeError::Cancelled)
    }
}

pub fn service(encoder: impl Encoder + 'static) -> (JobService, TempDir) {
    service_with(encoder, true)
}

pub fn service_with(
    encoder: impl Encoder + 'static,
    encoder_available: bool,
) -> (JobService, TempDir) {
    let root = tempfile::tempdir().expect("failed to create staging root");
    let runner = JobRunner::new(
        Arc::new(LissajousFrames),
        Arc::new(encoder),
        RunnerConfig::default().with_staging_root(root.path()),
    )
    .expect("default runner config is valid");
    (JobService::new(runner, encoder_available), root)
}
