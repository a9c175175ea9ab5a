//! Color types shared by parts and pixel surfaces.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Stroke/fill color as carried on the wire.
///
/// Red, green and blue are bytes; alpha is a fraction in `[0, 1]`.
/// Serialized as a four-element array `[r, g, b, a]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(u8, u8, u8, f32)", into = "(u8, u8, u8, f32)")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 1.0)
    }

    /// Whether alpha is a finite value in `[0, 1]`.
    pub fn has_valid_alpha(&self) -> bool {
        self.a.is_finite() && (0.0..=1.0).contains(&self.a)
    }

    /// Alpha as a byte, floored the same way a canvas stores it.
    pub fn alpha_byte(&self) -> u8 {
        (self.a.clamp(0.0, 1.0) * 255.0).floor() as u8
    }

    /// Byte-per-channel form used for pixel comparison and writes.
    pub fn to_rgba8(&self) -> Rgba8 {
        Rgba8::new(self.r, self.g, self.b, self.alpha_byte())
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::black()
    }
}

impl From<(u8, u8, u8, f32)> for Rgba {
    fn from((r, g, b, a): (u8, u8, u8, f32)) -> Self {
        Self::new(r, g, b, a)
    }
}

impl From<Rgba> for (u8, u8, u8, f32) {
    fn from(color: Rgba) -> Self {
        (color.r, color.g, color.b, color.a)
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.alpha_byte())
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, f32::from(rgba.a) / 255.0)
    }
}

/// A single RGBA pixel, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const fn from_array([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }

    /// Composite `src` over this pixel (source-over).
    pub fn blend(self, src: Rgba8) -> Rgba8 {
        match src.a {
            255 => src,
            0 => self,
            _ => {
                let sa = u32::from(src.a);
                let da = u32::from(self.a);
                // Output alpha scaled by 255.
                let out_a = sa * 255 + da * (255 - sa);
                if out_a == 0 {
                    return Rgba8::TRANSPARENT;
                }
                let channel = |s: u8, d: u8| -> u8 {
                    let num = u32::from(s) * sa * 255 + u32::from(d) * da * (255 - sa);
                    ((num + out_a / 2) / out_a) as u8
                };
                Rgba8::new(
                    channel(src.r, self.r),
                    channel(src.g, self.g),
                    channel(src.b, self.b),
                    ((out_a + 127) / 255) as u8,
                )
            }
        }
    }
}

impl From<Color> for Rgba8 {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}
