//! Job domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque handle of a submitted job
///
/// Backed by a random (v4) UUID so identifiers cannot be enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Tag reported while a job has not started producing output
pub const STATUS_PENDING: &str = "pending";
/// Tag reported once the result is ready
pub const STATUS_COMPLETE: &str = "complete";
/// Tag reported when a job ended without a result
pub const STATUS_ERROR: &str = "error";

/// Progress of a running job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Progress {
    /// `frame` of `total` frames have been rendered and staged
    Rendering { frame: u32, total: u32 },
    /// All frames are staged and the encoder is running
    Encoding,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Rendering { frame, total } => write!(f, "generated frame {}/{}", frame, total),
            Progress::Encoding => write!(f, "encoding animated WebP"),
        }
    }
}

/// Why a job ended without a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobFailure {
    Cancelled,
    Failed(String),
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobFailure::Cancelled => write!(f, "job was cancelled"),
            JobFailure::Failed(msg) => f.write_str(msg),
        }
    }
}

/// Lifecycle status of a job
///
/// `Complete` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Pending,
    Running(Progress),
    Complete,
    Failed(JobFailure),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed(_))
    }

    /// The status string shown to clients
    pub fn tag(&self) -> String {
        match self {
            JobStatus::Pending => STATUS_PENDING.to_string(),
            JobStatus::Running(progress) => progress.to_string(),
            JobStatus::Complete => STATUS_COMPLETE.to_string(),
            JobStatus::Failed(_) => STATUS_ERROR.to_string(),
        }
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        match self {
            JobStatus::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}
