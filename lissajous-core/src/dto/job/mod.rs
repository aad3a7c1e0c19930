//! Job DTOs for client/server communication

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::color::{ColorError, Rgba};
use crate::domain::job::{JobId, JobStatus};
use crate::domain::shape::{ShapeError, ShapeParams};

/// Form submitted to create a render job
///
/// Every field is optional; missing or empty fields fall back to the
/// defaults of [`ShapeParams`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycles: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub res: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames: Option<String>,
    #[serde(rename = "bgColor", default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(rename = "fgColor", default, skip_serializing_if = "Option::is_none")]
    pub fg_color: Option<String>,
}

/// Reasons a submission is rejected before any job is created
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid {field}: {source}")]
    Color {
        field: &'static str,
        #[source]
        source: ColorError,
    },

    #[error("Invalid {field}: {value:?} is not a number")]
    Number { field: &'static str, value: String },

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

impl RenderForm {
    /// Parses and validates the form into shape parameters
    pub fn into_params(self) -> Result<ShapeParams, ValidationError> {
        let defaults = ShapeParams::default();

        let params = ShapeParams {
            cycles: parse_number(self.cycles, "cycles")?.unwrap_or(defaults.cycles),
            resolution: parse_number(self.res, "res")?.unwrap_or(defaults.resolution),
            size: parse_number(self.size, "size")?.unwrap_or(defaults.size),
            fps: parse_number(self.frames, "frames")?.unwrap_or(defaults.fps),
            background: parse_color(self.bg_color, "bgColor")?.unwrap_or(defaults.background),
            foreground: parse_color(self.fg_color, "fgColor")?.unwrap_or(defaults.foreground),
        };

        params.validate()?;
        Ok(params)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<T>, ValidationError> {
    non_empty(value)
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| ValidationError::Number { field, value: v })
        })
        .transpose()
}

fn parse_color(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<Rgba>, ValidationError> {
    non_empty(value)
        .map(|v| Rgba::parse(&v).map_err(|source| ValidationError::Color { field, source }))
        .transpose()
}

/// Response returned when a job has been accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(rename = "jobID")]
    pub job_id: JobId,
    pub status: String,
}

impl SubmitResponse {
    pub fn started(job_id: JobId) -> Self {
        Self {
            job_id,
            status: format!(
                "Job started, check status with /lissajous/status/{}",
                job_id
            ),
        }
    }
}

/// Snapshot of a job's status as seen by pollers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusView {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&JobStatus> for JobStatusView {
    fn from(status: &JobStatus) -> Self {
        Self {
            status: status.tag(),
            error: status.failure().map(|f| f.to_string()),
        }
    }
}

impl JobStatusView {
    pub fn is_complete(&self) -> bool {
        self.status == crate::domain::job::STATUS_COMPLETE
    }

    pub fn is_error(&self) -> bool {
        self.status == crate::domain::job::STATUS_ERROR
    }
}
