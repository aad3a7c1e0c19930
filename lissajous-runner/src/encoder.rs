//! Animation encoding
//!
//! Turns a directory of numbered PNG frames into a single animated WebP by
//! running ffmpeg and collecting its standard output.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;

/// Input handed to an [`Encoder`]
#[derive(Debug, Clone, Copy)]
pub struct EncodeRequest<'a> {
    /// printf-style pattern of the staged frames, e.g. `dir/frame_%05d.png`
    pub input_pattern: &'a Path,
    pub fps: u32,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("ffmpeg binary {0:?} is not available")]
    Unavailable(PathBuf),

    #[error("failed to start ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("ffmpeg produced no output")]
    EmptyOutput,

    #[error("encoding was cancelled")]
    Cancelled,
}

/// Encodes staged frames into an animation
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Encodes every frame matching the request's pattern
    ///
    /// Must stop and return [`EncodeError::Cancelled`] once `cancel` fires.
    async fn encode(
        &self,
        request: EncodeRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, EncodeError>;
}

/// Encoder backed by an external ffmpeg process
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    binary: PathBuf,
    inherit_stderr: bool,
}

impl FfmpegEncoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            inherit_stderr: false,
        }
    }

    /// Forward ffmpeg diagnostics to our stderr instead of capturing them
    pub fn with_inherited_stderr(mut self, inherit: bool) -> Self {
        self.inherit_stderr = inherit;
        self
    }

    /// Encoder using the binary and stderr mode of a runner configuration
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(&config.ffmpeg_binary).with_inherited_stderr(config.encoder_debug)
    }

    /// Checks that the binary can be executed
    pub async fn is_available(&self) -> bool {
        let status = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {
                info!("ffmpeg is available at {}", self.binary.display());
                true
            }
            Ok(status) => {
                warn!(
                    "ffmpeg at {} is not working correctly: {}",
                    self.binary.display(),
                    status
                );
                false
            }
            Err(e) => {
                warn!("Failed to execute {}: {}", self.binary.display(), e);
                false
            }
        }
    }

    fn command(&self, request: EncodeRequest<'_>) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .args(["-y", "-loglevel", "error"])
            .arg("-framerate")
            .arg(request.fps.to_string())
            .arg("-i")
            .arg(request.input_pattern)
            .args(["-loop", "0"])
            .args(["-lossless", "1"])
            .args(["-c:v", "libwebp_anim"])
            .arg("-an")
            .args(["-f", "webp"])
            .arg("pipe:1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(if self.inherit_stderr {
                Stdio::inherit()
            } else {
                Stdio::piped()
            })
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(
        &self,
        request: EncodeRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, EncodeError> {
        debug!(
            "Running {} on {} at {} fps",
            self.binary.display(),
            request.input_pattern.display(),
            request.fps
        );

        let child = self.command(request).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EncodeError::Unavailable(self.binary.clone())
            } else {
                EncodeError::Spawn(e)
            }
        })?;

        // Dropping the wait future drops the child, which kills it
        let output = tokio::select! {
            output = child.wait_with_output() => output.map_err(EncodeError::Spawn)?,
            _ = cancel.cancelled() => {
                debug!("Cancellation requested, killing ffmpeg");
                return Err(EncodeError::Cancelled);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(EncodeError::Failed {
                status: output.status,
                stderr,
            });
        }

        if output.stdout.is_empty() {
            return Err(EncodeError::EmptyOutput);
        }

        debug!("ffmpeg produced {} bytes", output.stdout.len());
        Ok(output.stdout)
    }
}
