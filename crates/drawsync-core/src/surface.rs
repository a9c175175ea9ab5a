//! Pixel surface abstraction.
//!
//! The engine never touches a rendering backend directly. It talks to a
//! [`PixelSurface`], which owns the pixels and knows how to stroke paths.
//! All coordinates are surface-local pixels; device pixel ratio scaling is
//! the surface's business.

use crate::color::Rgba8;
use crate::gesture::StrokeStyle;
use kurbo::Point;

/// Row-major RGBA buffer, four bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// A fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgba8::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Rgba8) -> Self {
        let len = width as usize * height as usize;
        let data = color.to_array().repeat(len);
        Self { width, height, data }
    }

    /// Wrap raw RGBA bytes. Returns `None` if the length does not match.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize * 4).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        Some(Rgba8::new(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ))
    }

    /// Set a pixel. Out-of-bounds writes are dropped.
    pub fn set(&mut self, x: u32, y: u32, color: Rgba8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.offset(x, y);
        self.data[i..i + 4].copy_from_slice(&color.to_array());
    }

    /// Copy a `width` x `height` region starting at `(x, y)`, clipped to the buffer.
    pub fn region(&self, x: u32, y: u32, width: u32, height: u32) -> PixelBuffer {
        let width = width.min(self.width.saturating_sub(x));
        let height = height.min(self.height.saturating_sub(y));
        let mut out = PixelBuffer::new(width, height);
        if width == 0 || height == 0 {
            return out;
        }
        let row_bytes = width as usize * 4;
        for row in 0..height {
            let src = self.offset(x, y + row);
            let dst = out.offset(0, row);
            out.data[dst..dst + row_bytes].copy_from_slice(&self.data[src..src + row_bytes]);
        }
        out
    }

    /// Paste `other` with its top-left corner at `(x, y)`, clipped to the buffer.
    pub fn paste(&mut self, other: &PixelBuffer, x: u32, y: u32) {
        let width = other.width.min(self.width.saturating_sub(x));
        let height = other.height.min(self.height.saturating_sub(y));
        if width == 0 || height == 0 {
            return;
        }
        let row_bytes = width as usize * 4;
        for row in 0..height {
            let src = other.offset(0, row);
            let dst = self.offset(x, y + row);
            self.data[dst..dst + row_bytes].copy_from_slice(&other.data[src..src + row_bytes]);
        }
    }

    /// Fill a region with one color, clipped to the buffer.
    pub fn fill_region(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgba8) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for row in y..y_end {
            for col in x..x_end {
                self.set(col, row, color);
            }
        }
    }
}

/// Immutable capture of surface pixels.
///
/// Snapshots are copied out of the surface on capture and never mutated;
/// use [`Snapshot::into_buffer`] to get an editable copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(PixelBuffer);

impl Snapshot {
    pub fn buffer(&self) -> &PixelBuffer {
        &self.0
    }

    pub fn into_buffer(self) -> PixelBuffer {
        self.0
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }
}

impl From<PixelBuffer> for Snapshot {
    fn from(buffer: PixelBuffer) -> Self {
        Self(buffer)
    }
}

/// A raster the engine draws on.
pub trait PixelSurface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Copy a region of pixels.
    fn capture_region(&self, x: u32, y: u32, width: u32, height: u32) -> Snapshot;

    /// Write a captured region back with its top-left corner at `(x, y)`.
    fn restore_region(&mut self, snapshot: &Snapshot, x: u32, y: u32);

    /// Reset a region to the surface background.
    fn clear_region(&mut self, x: u32, y: u32, width: u32, height: u32);

    /// Stroke a polyline with round caps and joins.
    ///
    /// With `from` set, segments run `from -> to[0] -> to[1] -> ...` and
    /// continue the current path: pixels it already painted are not painted
    /// again. Without it a new path starts at `to[0]`, which is drawn as a dot.
    fn stroke_segment(&mut self, from: Option<Point>, to: &[Point], style: &StrokeStyle);

    fn read_pixel(&self, x: u32, y: u32) -> Option<Rgba8>;

    fn write_pixel(&mut self, x: u32, y: u32, color: Rgba8);

    /// Present pending pixel writes.
    fn flush_pixels(&mut self);

    /// Capture the whole surface.
    fn capture(&self) -> Snapshot {
        self.capture_region(0, 0, self.width(), self.height())
    }

    /// Restore a whole-surface capture.
    fn restore(&mut self, snapshot: &Snapshot) {
        self.restore_region(snapshot, 0, 0);
    }

    /// Clear the whole surface.
    fn clear(&mut self) {
        self.clear_region(0, 0, self.width(), self.height());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_get_set() {
        let mut buf = PixelBuffer::new(4, 3);
        assert_eq!(buf.as_bytes().len(), 48);
        buf.set(3, 2, Rgba8::new(1, 2, 3, 4));
        assert_eq!(buf.get(3, 2), Some(Rgba8::new(1, 2, 3, 4)));
        assert_eq!(buf.get(4, 0), None);
        buf.set(10, 10, Rgba8::new(9, 9, 9, 9));
    }

    #[test]
    fn test_from_raw_checks_length() {
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_some());
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn test_region_and_paste_clip() {
        let mut buf = PixelBuffer::new(4, 4);
        buf.set(2, 2, Rgba8::new(255, 0, 0, 255));
        let region = buf.region(2, 2, 10, 10);
        assert_eq!((region.width(), region.height()), (2, 2));
        assert_eq!(region.get(0, 0), Some(Rgba8::new(255, 0, 0, 255)));

        let mut target = PixelBuffer::new(3, 3);
        target.paste(&region, 2, 2);
        assert_eq!(target.get(2, 2), Some(Rgba8::new(255, 0, 0, 255)));
    }

    #[test]
    fn test_fill_region() {
        let mut buf = PixelBuffer::new(3, 3);
        buf.fill_region(1, 1, 5, 5, Rgba8::new(0, 0, 0, 255));
        assert_eq!(buf.get(0, 0), Some(Rgba8::TRANSPARENT));
        assert_eq!(buf.get(2, 2), Some(Rgba8::new(0, 0, 0, 255)));
    }
}
