//! Software raster surface.
//!
//! Strokes are rasterized without anti-aliasing: pixel `(x, y)` is covered
//! when the point `(x, y)` lies within half the stroke width of the path.
//! A pixel is blended at most once per path, even where segments overlap or
//! the path is split across calls, so translucent strokes come out the same
//! however they were batched.

use crate::color::Rgba8;
use crate::gesture::StrokeStyle;
use crate::surface::{PixelBuffer, PixelSurface, Snapshot};
use std::collections::HashSet;
use kurbo::{Line, ParamCurveNearest, Point, Rect};
use peniko::Color;

/// Smallest stroke radius; keeps one-pixel-wide strokes visible.
const MIN_RADIUS: f64 = 0.5;

/// In-memory RGBA surface.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: PixelBuffer,
    background: Rgba8,
    /// Set by any write, cleared by `flush_pixels`.
    dirty: bool,
    /// Pixels already painted by the open path.
    painted: HashSet<(u32, u32)>,
}

impl RasterSurface {
    /// A transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: PixelBuffer::new(width, height),
            background: Rgba8::TRANSPARENT,
            dirty: false,
            painted: HashSet::new(),
        }
    }

    /// Use `color` as the cleared state and paint the surface with it.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color.into();
        let (width, height) = (self.pixels.width(), self.pixels.height());
        self.pixels.fill_region(0, 0, width, height, self.background);
        self
    }

    pub fn background(&self) -> Rgba8 {
        self.background
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Whether pixels changed since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn covered(lines: &[Line], point: Point, radius: f64) -> bool {
        let radius_sq = radius * radius;
        lines.iter().any(|line| {
            let distance_sq = if line.p0 == line.p1 {
                (point - line.p0).hypot2()
            } else {
                line.nearest(point, 1e-6).distance_sq
            };
            distance_sq <= radius_sq
        })
    }
}

impl PixelSurface for RasterSurface {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn capture_region(&self, x: u32, y: u32, width: u32, height: u32) -> Snapshot {
        self.pixels.region(x, y, width, height).into()
    }

    fn restore_region(&mut self, snapshot: &Snapshot, x: u32, y: u32) {
        self.pixels.paste(snapshot.buffer(), x, y);
        self.painted.clear();
        self.dirty = true;
    }

    fn clear_region(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.pixels.fill_region(x, y, width, height, self.background);
        self.painted.clear();
        self.dirty = true;
    }

    fn stroke_segment(&mut self, from: Option<Point>, to: &[Point], style: &StrokeStyle) {
        let Some(&first) = to.first() else {
            return;
        };
        let mut lines = Vec::with_capacity(to.len() + 1);
        let mut cursor = match from {
            Some(start) => start,
            None => {
                self.painted.clear();
                lines.push(Line::new(first, first));
                first
            }
        };
        for &point in to {
            lines.push(Line::new(cursor, point));
            cursor = point;
        }

        let radius = (f64::from(style.width) / 2.0).max(MIN_RADIUS);
        let bounds = lines
            .iter()
            .map(|line| Rect::from_points(line.p0, line.p1))
            .reduce(|a, b| a.union(b))
            .unwrap_or_default()
            .inflate(radius, radius);
        let (max_x, max_y) = (
            f64::from(self.width()) - 1.0,
            f64::from(self.height()) - 1.0,
        );
        if bounds.x1 < 0.0 || bounds.y1 < 0.0 || bounds.x0 > max_x || bounds.y0 > max_y {
            return;
        }

        let src = style.color.to_rgba8();
        let (x0, y0) = (bounds.x0.max(0.0).ceil() as u32, bounds.y0.max(0.0).ceil() as u32);
        let (x1, y1) = (
            bounds.x1.min(max_x).floor() as u32,
            bounds.y1.min(max_y).floor() as u32,
        );
        for y in y0..=y1 {
            for x in x0..=x1 {
                if Self::covered(&lines, Point::new(f64::from(x), f64::from(y)), radius)
                    && self.painted.insert((x, y))
                {
                    if let Some(dst) = self.pixels.get(x, y) {
                        self.pixels.set(x, y, dst.blend(src));
                    }
                }
            }
        }
        self.dirty = true;
    }

    fn read_pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        self.pixels.get(x, y)
    }

    fn write_pixel(&mut self, x: u32, y: u32, color: Rgba8) {
        self.pixels.set(x, y, color);
        self.dirty = true;
    }

    fn flush_pixels(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    const RED: Rgba8 = Rgba8::new(255, 0, 0, 255);

    fn red_style(width: f32) -> StrokeStyle {
        StrokeStyle::new(Rgba::new(255, 0, 0, 1.0), width)
    }

    #[test]
    fn test_dot_covers_radius() {
        let mut surface = RasterSurface::new(20, 20);
        surface.stroke_segment(None, &[Point::new(10.0, 10.0)], &red_style(2.0));
        assert_eq!(surface.read_pixel(10, 10), Some(RED));
        assert_eq!(surface.read_pixel(11, 10), Some(RED));
        assert_eq!(surface.read_pixel(10, 9), Some(RED));
        assert_eq!(surface.read_pixel(11, 11), Some(Rgba8::TRANSPARENT));
        assert!(surface.is_dirty());
        surface.flush_pixels();
        assert!(!surface.is_dirty());
    }

    #[test]
    fn test_segment_from_cursor() {
        let mut surface = RasterSurface::new(20, 20);
        surface.stroke_segment(
            Some(Point::new(2.0, 5.0)),
            &[Point::new(12.0, 5.0)],
            &red_style(1.0),
        );
        for x in 2..=12 {
            assert_eq!(surface.read_pixel(x, 5), Some(RED), "x = {x}");
        }
        assert_eq!(surface.read_pixel(7, 6), Some(Rgba8::TRANSPARENT));
    }

    #[test]
    fn test_split_path_matches_single_call() {
        let points = [
            Point::new(1.0, 1.0),
            Point::new(8.0, 6.0),
            Point::new(15.0, 2.0),
        ];
        let mut whole = RasterSurface::new(20, 20);
        whole.stroke_segment(None, &points, &red_style(3.0));

        let mut split = RasterSurface::new(20, 20);
        split.stroke_segment(None, &points[..1], &red_style(3.0));
        split.stroke_segment(Some(points[0]), &points[1..2], &red_style(3.0));
        split.stroke_segment(Some(points[1]), &points[2..], &red_style(3.0));

        assert_eq!(whole.pixels(), split.pixels());
    }

    #[test]
    fn test_translucent_path_blends_each_pixel_once() {
        let style = StrokeStyle::new(Rgba::new(255, 0, 0, 0.5), 4.0);
        let points = [
            Point::new(2.0, 2.0),
            Point::new(9.0, 9.0),
            Point::new(16.0, 2.0),
            Point::new(9.0, 2.0),
        ];
        let mut whole = RasterSurface::new(20, 20);
        whole.stroke_segment(None, &points, &style);

        let mut split = RasterSurface::new(20, 20);
        split.stroke_segment(None, &points[..1], &style);
        for pair in points.windows(2) {
            split.stroke_segment(Some(pair[0]), &pair[1..], &style);
        }
        assert_eq!(whole.pixels(), split.pixels());

        // Joints carry the same alpha as the middle of a segment.
        let single = alpha(&whole, 5, 5);
        assert!(single > 0 && single < 255);
        assert_eq!(alpha(&whole, 9, 9), single);
        assert_eq!(alpha(&whole, 16, 2), single);

        // A new path paints over the old one again.
        whole.stroke_segment(None, &[Point::new(5.0, 5.0)], &style);
        assert!(alpha(&whole, 5, 5) > single);
    }

    fn alpha(surface: &RasterSurface, x: u32, y: u32) -> u8 {
        surface.read_pixel(x, y).map_or(0, |p| p.a)
    }

    #[test]
    fn test_stroke_outside_surface_is_clipped() {
        let mut surface = RasterSurface::new(5, 5);
        surface.stroke_segment(None, &[Point::new(50.0, 50.0)], &red_style(2.0));
        assert_eq!(surface.pixels(), RasterSurface::new(5, 5).pixels());
    }

    #[test]
    fn test_clear_restores_background() {
        let mut surface = RasterSurface::new(4, 4).with_background(Color::WHITE);
        assert_eq!(surface.read_pixel(0, 0), Some(Rgba8::new(255, 255, 255, 255)));
        surface.write_pixel(1, 1, RED);
        surface.clear();
        assert_eq!(surface.read_pixel(1, 1), Some(Rgba8::new(255, 255, 255, 255)));
    }

    #[test]
    fn test_capture_restore_roundtrip() {
        let mut surface = RasterSurface::new(4, 4);
        surface.write_pixel(0, 0, RED);
        let snapshot = surface.capture();
        surface.clear();
        surface.restore(&snapshot);
        assert_eq!(surface.read_pixel(0, 0), Some(RED));
    }
}
