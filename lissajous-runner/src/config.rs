//! Runner configuration
//!
//! Tunables for job execution: progress reporting cadence, queue sizing,
//! where frames are staged, and how the encoder is invoked.

use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_PROGRESS_CAPACITY: usize = 20;
pub const DEFAULT_PROGRESS_INTERVAL: u32 = 100;
pub const DEFAULT_FFMPEG_BINARY: &str = "ffmpeg";

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Capacity of each job's progress queue; pushes beyond it are dropped
    pub progress_capacity: usize,

    /// A progress message is emitted every `progress_interval` frames
    pub progress_interval: u32,

    /// Directory under which per-job staging directories are created
    pub staging_root: PathBuf,

    /// Path or name of the ffmpeg executable
    pub ffmpeg_binary: PathBuf,

    /// Forward ffmpeg's stderr to ours instead of capturing it
    pub encoder_debug: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("progress_capacity must be greater than 0")]
    ZeroProgressCapacity,

    #[error("progress_interval must be greater than 0")]
    ZeroProgressInterval,

    #[error("ffmpeg_binary cannot be empty")]
    EmptyFfmpegBinary,
}

impl RunnerConfig {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.progress_capacity == 0 {
            return Err(ConfigError::ZeroProgressCapacity);
        }

        if self.progress_interval == 0 {
            return Err(ConfigError::ZeroProgressInterval);
        }

        if self.ffmpeg_binary.as_os_str().is_empty() {
            return Err(ConfigError::EmptyFfmpegBinary);
        }

        Ok(())
    }

    pub fn with_staging_root(mut self, staging_root: impl Into<PathBuf>) -> Self {
        self.staging_root = staging_root.into();
        self
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            progress_capacity: DEFAULT_PROGRESS_CAPACITY,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            staging_root: std::env::temp_dir(),
            ffmpeg_binary: PathBuf::from(DEFAULT_FFMPEG_BINARY),
            encoder_debug: false,
        }
    }
}
