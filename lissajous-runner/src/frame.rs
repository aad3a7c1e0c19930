//! Frame rendering
//!
//! A frame is a square canvas with the background painted first and the
//! Lissajous curve plotted over it in the foreground color.

use std::io::Cursor;

use image::{ImageFormat, Rgba as Pixel, RgbaImage};
use lissajous_core::domain::color::Rgba;
use lissajous_core::domain::shape::{ShapeParams, Waveform};

/// Produces the image for one frame of an animation
///
/// Implementations are called from a blocking worker thread.
pub trait FrameSource: Send + Sync {
    fn render(&self, params: &ShapeParams, index: u32, wave: Waveform) -> RgbaImage;
}

/// Plots `x = sin(t)`, `y = sin(t * freq + phase)` for `t` in `[0, cycles * 2π)`
#[derive(Debug, Clone, Copy, Default)]
pub struct LissajousFrames;

impl FrameSource for LissajousFrames {
    fn render(&self, params: &ShapeParams, _index: u32, wave: Waveform) -> RgbaImage {
        let side = params.canvas_side();
        let mut canvas = RgbaImage::from_pixel(side, side, to_pixel(params.background));
        let foreground = to_pixel(params.foreground);

        let size = f64::from(params.size);
        let t_max = params.t_max();

        let mut k: u64 = 0;
        loop {
            let t = k as f64 * params.resolution;
            if t >= t_max {
                break;
            }
            k += 1;

            let x = size + (t.sin() * size).round();
            let y = size + ((t * wave.freq + wave.phase).sin() * size).round();

            if let Some((px, py)) = to_coordinate(x, side).zip(to_coordinate(y, side)) {
                canvas.put_pixel(px, py, foreground);
            }
        }

        canvas
    }
}

fn to_pixel(color: Rgba) -> Pixel<u8> {
    Pixel(color.to_array())
}

fn to_coordinate(value: f64, side: u32) -> Option<u32> {
    if value < 0.0 || value >= f64::from(side) {
        return None;
    }
    Some(value as u32)
}

/// Encodes a frame as PNG
pub fn encode_png(frame: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Cursor::new(Vec::new());
    frame.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}
