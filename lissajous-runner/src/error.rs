//! Runner errors

use lissajous_core::domain::job::JobFailure;
use lissajous_core::domain::shape::ShapeError;
use thiserror::Error;

use crate::encoder::EncodeError;

/// Reasons a job ends without a result
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(#[from] ShapeError),

    #[error("failed to stage frames: {0}")]
    Staging(#[source] std::io::Error),

    #[error("failed to render frame {index}: {message}")]
    Frame { index: u32, message: String },

    #[error("failed to read random bytes: {0}")]
    Entropy(#[from] rand::Error),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("job was cancelled")]
    Cancelled,

    #[error("job execution panicked: {0}")]
    Panicked(String),
}

impl RunnerError {
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            RunnerError::Cancelled | RunnerError::Encode(EncodeError::Cancelled)
        )
    }
}

impl From<RunnerError> for JobFailure {
    fn from(err: RunnerError) -> Self {
        if err.is_cancelled() {
            JobFailure::Cancelled
        } else {
            JobFailure::Failed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_maps_to_cancelled_failure() {
        assert_eq!(JobFailure::from(RunnerError::Cancelled), JobFailure::Cancelled);
        assert_eq!(
            JobFailure::from(RunnerError::Encode(EncodeError::Cancelled)),
            JobFailure::Cancelled
        );
    }

    #[test]
    fn test_failures_keep_message() {
        let failure = JobFailure::from(RunnerError::Encode(EncodeError::EmptyOutput));
        assert_eq!(
            failure,
            JobFailure::Failed("ffmpeg produced no output".to_string())
        );

        let failure = JobFailure::from(RunnerError::Frame {
            index: 3,
            message: "disk full".to_string(),
        });
        assert_eq!(
            failure,
            JobFailure::Failed("failed to render frame 3: disk full".to_string())
        );
    }
}
