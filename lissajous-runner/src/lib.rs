//! Lissajous Runner
//!
//! Renders Lissajous animations in the background and encodes them to
//! animated WebP.
//!
//! Architecture:
//! - Configuration: progress cadence, queue sizing, staging root, encoder
//! - Frames: per-frame rendering and PNG encoding
//! - Staging: per-job temporary directory of numbered frames
//! - Encoder: ffmpeg process turning staged frames into one animation
//! - Record: shared job state, progress queue, cancellation and completion
//! - Services: the job runner tying it all together

pub mod config;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod record;
pub mod service;
pub mod staging;

pub use config::RunnerConfig;
pub use encoder::{EncodeError, EncodeRequest, Encoder, FfmpegEncoder};
pub use error::RunnerError;
pub use frame::{FrameSource, LissajousFrames};
pub use record::{JobRecord, JobTicket};
pub use service::JobRunner;
