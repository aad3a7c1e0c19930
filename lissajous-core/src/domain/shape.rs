//! Shape domain types
//!
//! Parameters describing one Lissajous animation and the per-frame waveform.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use thiserror::Error;

use crate::domain::color::Rgba;

/// Length of every animation, in seconds
pub const ANIMATION_DURATION_SECS: u32 = 5;

pub const DEFAULT_CYCLES: f64 = 5.0;
pub const DEFAULT_RESOLUTION: f64 = 0.001;
pub const DEFAULT_SIZE: u32 = 100;
pub const DEFAULT_FPS: u32 = 60;

pub const MAX_FPS: u32 = 200;
pub const MAX_SIZE: u32 = 1000;

/// Upper bound on plotted samples per frame
pub const MAX_SAMPLES_PER_FRAME: f64 = 10_000_000.0;

/// Parameters of a single animation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeParams {
    /// Number of full `sin(t)` periods plotted per frame
    pub cycles: f64,
    /// Step between consecutive samples of `t`
    pub resolution: f64,
    /// Half the canvas side; the canvas is `2*size+1` pixels square
    pub size: u32,
    /// Frames per second of the encoded animation
    pub fps: u32,
    pub background: Rgba,
    pub foreground: Rgba,
}

/// Errors produced when shape parameters are out of range
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("cycles must be a positive finite number, got {0}")]
    InvalidCycles(f64),

    #[error("resolution must be a positive finite number, got {0}")]
    InvalidResolution(f64),

    #[error("size must be between 1 and {max}, got {0}", max = MAX_SIZE)]
    InvalidSize(u32),

    #[error("frame rate must be between 1 and {max}, got {0}", max = MAX_FPS)]
    InvalidFrameRate(u32),

    #[error("cycles / resolution yields {0:.0} samples per frame, which exceeds the limit")]
    TooManySamples(f64),
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            cycles: DEFAULT_CYCLES,
            resolution: DEFAULT_RESOLUTION,
            size: DEFAULT_SIZE,
            fps: DEFAULT_FPS,
            background: Rgba::BLACK,
            foreground: Rgba::WHITE,
        }
    }
}

impl ShapeParams {
    /// Side length of the square canvas in pixels
    pub fn canvas_side(&self) -> u32 {
        2 * self.size + 1
    }

    /// Total number of frames in the animation
    pub fn frame_count(&self) -> u32 {
        self.fps * ANIMATION_DURATION_SECS
    }

    /// Upper bound of the parameter `t`
    pub fn t_max(&self) -> f64 {
        self.cycles * TAU
    }

    /// Checks every parameter against its allowed range
    pub fn validate(&self) -> Result<(), ShapeError> {
        if !self.cycles.is_finite() || self.cycles <= 0.0 {
            return Err(ShapeError::InvalidCycles(self.cycles));
        }
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(ShapeError::InvalidResolution(self.resolution));
        }
        if self.size == 0 || self.size > MAX_SIZE {
            return Err(ShapeError::InvalidSize(self.size));
        }
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(ShapeError::InvalidFrameRate(self.fps));
        }

        let samples = self.t_max() / self.resolution;
        if samples > MAX_SAMPLES_PER_FRAME {
            return Err(ShapeError::TooManySamples(samples));
        }

        Ok(())
    }
}

/// Frequency and phase of the `y` component for one frame
///
/// `x(t) = sin(t)`, `y(t) = sin(t * freq + phase)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waveform {
    pub freq: f64,
    pub phase: f64,
}

impl Waveform {
    /// Maps two random bytes to `freq` in `[0, 3]` and `phase` in `[0, 2]`
    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        Self {
            freq: f64::from(bytes[0]) / 255.0 * 3.0,
            phase: f64::from(bytes[1]) / 255.0 * 2.0,
        }
    }
}
