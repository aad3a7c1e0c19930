//! Color domain types
//!
//! Colors arrive as hex strings (`#RRGGBB` or `#RRGGBBAA`, `#` optional) or as
//! the literal `random`, which picks a random opaque color.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Token accepted in place of a hex string to request a random opaque color
pub const RANDOM_COLOR_TOKEN: &str = "random";

/// An 8-bit RGBA color with straight alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Errors produced while parsing a color string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid length for hex color: {0:?}")]
    InvalidLength(String),

    #[error("invalid {channel} value: {value:?} is not a hex byte")]
    InvalidChannel { channel: &'static str, value: String },
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Generates a random color with max alpha
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self::opaque(rng.r#gen(), rng.r#gen(), rng.r#gen())
    }

    /// Parses a hex color string or the `random` token
    pub fn parse(input: &str) -> Result<Self, ColorError> {
        if input.eq_ignore_ascii_case(RANDOM_COLOR_TOKEN) {
            return Ok(Self::random());
        }

        let hex = input.strip_prefix('#').unwrap_or(input);
        if hex.len() != 6 && hex.len() != 8 {
            return Err(ColorError::InvalidLength(input.to_string()));
        }

        let r = parse_channel(hex, 0, "red")?;
        let g = parse_channel(hex, 2, "green")?;
        let b = parse_channel(hex, 4, "blue")?;
        let a = if hex.len() == 8 {
            parse_channel(hex, 6, "alpha")?
        } else {
            255
        };

        Ok(Self::new(r, g, b, a))
    }

    /// Serializes the color as `#rrggbbaa`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Parses the two hex digits starting at `offset`.
///
/// `hex.get` returns `None` when the range splits a multi-byte character, which
/// is reported like any other non-hex input.
fn parse_channel(hex: &str, offset: usize, channel: &'static str) -> Result<u8, ColorError> {
    let invalid = || ColorError::InvalidChannel {
        channel,
        value: hex.get(offset..offset + 2).unwrap_or(hex).to_string(),
    };

    let digits = hex.get(offset..offset + 2).ok_or_else(invalid)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    u8::from_str_radix(digits, 16).map_err(|_| invalid())
}

impl FromStr for Rgba {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
