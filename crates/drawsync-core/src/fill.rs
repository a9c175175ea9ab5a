//! 4-connected flood fill on a raw pixel buffer.

use crate::color::Rgba;
use crate::surface::{PixelBuffer, PixelSurface};
use kurbo::Point;

/// Fill the region connected to `seed` that exactly matches the seed pixel.
///
/// The seed is floored to a pixel. Matching compares all four channels.
/// Returns the number of pixels changed: `0` when the seed is off the
/// buffer or the seed pixel already has the fill color, which makes a
/// repeated fill a no-op.
pub fn flood_fill(buffer: &mut PixelBuffer, seed: Point, color: Rgba) -> usize {
    let (sx, sy) = (seed.x.floor(), seed.y.floor());
    if !sx.is_finite() || !sy.is_finite() {
        return 0;
    }
    let (sx, sy) = (sx as i64, sy as i64);
    if !buffer.contains(sx, sy) {
        return 0;
    }
    let fill = color.to_rgba8();
    let Some(target) = buffer.get(sx as u32, sy as u32) else {
        return 0;
    };
    if target == fill {
        return 0;
    }

    let mut filled = 0;
    let mut stack = vec![(sx, sy)];
    while let Some((x, y)) = stack.pop() {
        // Bounds and match are checked on pop; neighbors are pushed unconditionally.
        if !buffer.contains(x, y) {
            continue;
        }
        let (px, py) = (x as u32, y as u32);
        if buffer.get(px, py) != Some(target) {
            continue;
        }
        buffer.set(px, py, fill);
        filled += 1;
        stack.extend([(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]);
    }
    log::debug!("flood fill at ({sx}, {sy}) changed {filled} pixels");
    filled
}

/// Flood fill the whole surface, writing it back in one region update.
pub fn fill_surface<S: PixelSurface + ?Sized>(surface: &mut S, seed: Point, color: Rgba) -> usize {
    let mut buffer = surface.capture().into_buffer();
    let filled = flood_fill(&mut buffer, seed, color);
    if filled > 0 {
        surface.restore(&buffer.into());
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba8;

    const BLACK: Rgba8 = Rgba8::new(0, 0, 0, 255);
    const RED: Rgba8 = Rgba8::new(255, 0, 0, 255);
    const WALL: Rgba8 = Rgba8::new(0, 0, 255, 255);

    /// 10x10 black buffer split by a vertical wall at x = 5.
    fn walled() -> PixelBuffer {
        let mut buf = PixelBuffer::filled(10, 10, BLACK);
        for y in 0..10 {
            buf.set(5, y, WALL);
        }
        buf
    }

    #[test]
    fn test_fill_stops_at_boundary() {
        let mut buf = walled();
        let changed = flood_fill(&mut buf, Point::new(2.0, 2.0), Rgba::new(255, 0, 0, 1.0));
        assert_eq!(changed, 50);
        assert_eq!(buf.get(0, 0), Some(RED));
        assert_eq!(buf.get(4, 9), Some(RED));
        assert_eq!(buf.get(5, 5), Some(WALL));
        assert_eq!(buf.get(6, 5), Some(BLACK));
    }

    #[test]
    fn test_disconnected_same_color_untouched() {
        let mut buf = walled();
        flood_fill(&mut buf, Point::new(5.0, 5.0), Rgba::new(255, 0, 0, 1.0));
        assert_eq!(buf.get(5, 0), Some(RED));
        assert_eq!(buf.get(4, 0), Some(BLACK));
        assert_eq!(buf.get(6, 0), Some(BLACK));
    }

    #[test]
    fn test_fill_is_idempotent() {
        let mut buf = walled();
        let red = Rgba::new(255, 0, 0, 1.0);
        flood_fill(&mut buf, Point::new(7.0, 7.0), red);
        let once = buf.clone();
        assert_eq!(flood_fill(&mut buf, Point::new(7.0, 7.0), red), 0);
        assert_eq!(buf, once);
    }

    #[test]
    fn test_seed_is_floored() {
        let mut buf = walled();
        flood_fill(&mut buf, Point::new(4.9, 0.2), Rgba::new(255, 0, 0, 1.0));
        assert_eq!(buf.get(0, 0), Some(RED));
        assert_eq!(buf.get(6, 0), Some(BLACK));
    }

    #[test]
    fn test_out_of_bounds_seed_is_noop() {
        let mut buf = walled();
        let before = buf.clone();
        assert_eq!(flood_fill(&mut buf, Point::new(-1.0, 3.0), Rgba::new(255, 0, 0, 1.0)), 0);
        assert_eq!(flood_fill(&mut buf, Point::new(3.0, 10.0), Rgba::new(255, 0, 0, 1.0)), 0);
        assert_eq!(buf, before);
    }

    #[test]
    fn test_alpha_participates_in_match() {
        let mut buf = PixelBuffer::filled(3, 1, BLACK);
        buf.set(1, 0, Rgba8::new(0, 0, 0, 254));
        flood_fill(&mut buf, Point::new(0.0, 0.0), Rgba::new(255, 0, 0, 1.0));
        assert_eq!(buf.get(0, 0), Some(RED));
        assert_eq!(buf.get(1, 0), Some(Rgba8::new(0, 0, 0, 254)));
        assert_eq!(buf.get(2, 0), Some(BLACK));
    }

    #[test]
    fn test_fill_surface_writes_back() {
        use crate::raster::RasterSurface;

        let mut surface = RasterSurface::new(3, 3);
        let red = Rgba::new(255, 0, 0, 1.0);
        assert_eq!(fill_surface(&mut surface, Point::new(1.0, 1.0), red), 9);
        assert_eq!(surface.read_pixel(2, 2), Some(RED));
        assert_eq!(fill_surface(&mut surface, Point::new(1.0, 1.0), red), 0);
    }

    #[test]
    fn test_fill_alpha_is_floored() {
        let mut buf = PixelBuffer::new(2, 2);
        flood_fill(&mut buf, Point::new(0.0, 0.0), Rgba::new(10, 20, 30, 0.5));
        assert_eq!(buf.get(1, 1), Some(Rgba8::new(10, 20, 30, 127)));
    }
}
