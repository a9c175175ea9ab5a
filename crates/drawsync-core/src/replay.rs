//! Application of remote parts.
//!
//! A remote stroke may arrive split across several drawing parts. While one
//! is in flight the engine sits in [`ReplayState::RemoteStrokeOpen`] and
//! continues the path from its cursor instead of starting a new one. This is
//! only correct when parts arrive in the order they were sent.

use crate::error::EngineResult;
use crate::fill::fill_surface;
use crate::history::HistoryStack;
use crate::part::{Part, PartKind};
use crate::surface::PixelSurface;
use kurbo::Point;

/// Remote stroke tracking.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ReplayState {
    #[default]
    Idle,
    /// A remote stroke is mid-flight; the next drawing part continues from `cursor`.
    RemoteStrokeOpen { cursor: Point },
}

/// Applies remote parts to a surface and its history.
#[derive(Debug, Clone, Default)]
pub struct ReplayEngine {
    state: ReplayState,
}

impl ReplayEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    /// Forget any remote stroke in flight.
    pub fn reset(&mut self) {
        self.state = ReplayState::Idle;
    }

    /// End a remote stroke whose author stopped sending, e.g. after a turn
    /// change. What was drawn so far is recorded as one edit.
    ///
    /// Returns `false` when no remote stroke was open.
    pub fn close_stroke<S: PixelSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        history: &mut HistoryStack,
    ) -> bool {
        let ReplayState::RemoteStrokeOpen { cursor } = self.state else {
            return false;
        };
        history.record(surface);
        surface.flush_pixels();
        self.state = ReplayState::Idle;
        log::debug!("closed remote stroke abandoned at {cursor:?}");
        true
    }

    /// Apply one part.
    ///
    /// The part is validated first; a malformed part is rejected before the
    /// surface or history is touched.
    pub fn apply<S: PixelSurface + ?Sized>(
        &mut self,
        part: &Part,
        surface: &mut S,
        history: &mut HistoryStack,
    ) -> EngineResult<()> {
        part.validate()?;
        match part.kind() {
            PartKind::Clear => {
                history.clear_future();
                surface.clear();
                history.record(surface);
            }
            PartKind::Filling => {
                history.clear_future();
                if let Some(seed) = part.points().next() {
                    fill_surface(surface, seed, part.color());
                }
                history.record(surface);
            }
            PartKind::Undo => {
                history.undo(surface);
            }
            PartKind::Redo => {
                history.redo(surface);
            }
            PartKind::Drawing => self.apply_drawing(part, surface, history),
        }
        surface.flush_pixels();
        Ok(())
    }

    fn apply_drawing<S: PixelSurface + ?Sized>(
        &mut self,
        part: &Part,
        surface: &mut S,
        history: &mut HistoryStack,
    ) {
        history.clear_future();
        let points: Vec<Point> = part.points().collect();
        let style = part.style();
        let cursor = match self.state {
            ReplayState::Idle => {
                surface.stroke_segment(None, &points, &style);
                points.last().copied()
            }
            ReplayState::RemoteStrokeOpen { cursor } => {
                surface.stroke_segment(Some(cursor), &points, &style);
                Some(points.last().copied().unwrap_or(cursor))
            }
        };

        self.state = match (part.is_gesture_end(), cursor) {
            (false, Some(cursor)) => ReplayState::RemoteStrokeOpen { cursor },
            _ => {
                history.record(surface);
                ReplayState::Idle
            }
        };
        log::debug!("remote drawing part applied, state now {:?}", self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Rgba, Rgba8};
    use crate::error::{EngineError, PartDefect};
    use crate::gesture::StrokeStyle;
    use crate::raster::RasterSurface;

    const RED: Rgba8 = Rgba8::new(255, 0, 0, 255);

    fn style() -> StrokeStyle {
        StrokeStyle::new(Rgba::new(255, 0, 0, 1.0), 1.0)
    }

    fn setup() -> (ReplayEngine, RasterSurface, HistoryStack) {
        let surface = RasterSurface::new(40, 40);
        let history = HistoryStack::new(&surface);
        (ReplayEngine::new(), surface, history)
    }

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_split_stroke_is_continuous() {
        let (mut replay, mut surface, mut history) = setup();
        let first = Part::drawing(&pts(&[(10.0, 10.0), (20.0, 20.0)]), style(), false);
        let second = Part::drawing(&pts(&[(20.0, 20.0), (30.0, 10.0)]), style(), true);

        replay.apply(&first, &mut surface, &mut history).unwrap();
        assert_eq!(
            replay.state(),
            ReplayState::RemoteStrokeOpen { cursor: Point::new(20.0, 20.0) }
        );
        assert_eq!(history.past_len(), 1);

        replay.apply(&second, &mut surface, &mut history).unwrap();
        assert_eq!(replay.state(), ReplayState::Idle);
        assert_eq!(history.past_len(), 2);

        let mut expected = RasterSurface::new(40, 40);
        expected.stroke_segment(None, &pts(&[(10.0, 10.0), (20.0, 20.0), (30.0, 10.0)]), &style());
        assert_eq!(surface.pixels(), expected.pixels());
    }

    #[test]
    fn test_continuation_does_not_reanchor() {
        let (mut replay, mut surface, mut history) = setup();
        replay
            .apply(&Part::drawing(&pts(&[(5.0, 5.0)]), style(), false), &mut surface, &mut history)
            .unwrap();
        replay
            .apply(&Part::drawing(&pts(&[(15.0, 5.0)]), style(), true), &mut surface, &mut history)
            .unwrap();
        // The gap between the two parts is bridged.
        assert_eq!(surface.read_pixel(10, 5), Some(RED));
    }

    #[test]
    fn test_single_part_stroke_returns_to_idle() {
        let (mut replay, mut surface, mut history) = setup();
        let dot = Part::drawing(&pts(&[(3.0, 3.0)]), style(), true);
        replay.apply(&dot, &mut surface, &mut history).unwrap();
        assert_eq!(replay.state(), ReplayState::Idle);
        assert_eq!(surface.read_pixel(3, 3), Some(RED));
        assert!(history.can_undo());
    }

    #[test]
    fn test_empty_terminator_closes_stroke() {
        let (mut replay, mut surface, mut history) = setup();
        replay
            .apply(&Part::drawing(&pts(&[(1.0, 1.0), (4.0, 1.0)]), style(), false), &mut surface, &mut history)
            .unwrap();
        replay
            .apply(&Part::drawing(&[], style(), true), &mut surface, &mut history)
            .unwrap();
        assert_eq!(replay.state(), ReplayState::Idle);
        assert_eq!(history.past_len(), 2);
    }

    #[test]
    fn test_malformed_part_leaves_surface_untouched() {
        let (mut replay, mut surface, mut history) = setup();
        replay
            .apply(&Part::drawing(&pts(&[(1.0, 1.0)]), style(), true), &mut surface, &mut history)
            .unwrap();
        let before = surface.capture();

        let bad = Part::from_raw(PartKind::Drawing, true, vec![10.0, 10.0, 20.0], Rgba::black(), 2.0);
        let err = replay.apply(&bad, &mut surface, &mut history).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidPart(PartDefect::OddCoordinateCount(3))
        ));
        assert_eq!(surface.capture(), before);
        assert_eq!(history.past_len(), 2);
        assert_eq!(replay.state(), ReplayState::Idle);
    }

    #[test]
    fn test_fill_part_floods_and_records() {
        let (mut replay, mut surface, mut history) = setup();
        let fill = Part::fill(Rgba::new(255, 0, 0, 1.0), Point::new(5.0, 5.0));
        replay.apply(&fill, &mut surface, &mut history).unwrap();
        assert_eq!(surface.read_pixel(39, 39), Some(RED));
        assert_eq!(history.past_len(), 2);

        let once = surface.capture();
        replay.apply(&fill, &mut surface, &mut history).unwrap();
        assert_eq!(surface.capture(), once);
    }

    #[test]
    fn test_clear_then_undo_restores() {
        let (mut replay, mut surface, mut history) = setup();
        replay
            .apply(&Part::drawing(&pts(&[(1.0, 1.0), (9.0, 9.0)]), style(), true), &mut surface, &mut history)
            .unwrap();
        let drawn = surface.capture();

        replay.apply(&Part::clear(), &mut surface, &mut history).unwrap();
        assert_eq!(surface.read_pixel(1, 1), Some(Rgba8::TRANSPARENT));

        replay.apply(&Part::undo(), &mut surface, &mut history).unwrap();
        assert_eq!(surface.capture(), drawn);

        replay.apply(&Part::redo(), &mut surface, &mut history).unwrap();
        assert_eq!(surface.read_pixel(1, 1), Some(Rgba8::TRANSPARENT));
    }

    #[test]
    fn test_close_stroke_records_and_stops_continuation() {
        let (mut replay, mut surface, mut history) = setup();
        assert!(!replay.close_stroke(&mut surface, &mut history));

        replay
            .apply(&Part::drawing(&pts(&[(2.0, 2.0)]), style(), false), &mut surface, &mut history)
            .unwrap();
        assert!(replay.close_stroke(&mut surface, &mut history));
        assert_eq!(replay.state(), ReplayState::Idle);
        assert_eq!(history.past_len(), 2);

        // A new author's stroke starts fresh instead of bridging from (2, 2).
        replay
            .apply(&Part::drawing(&pts(&[(30.0, 30.0)]), style(), true), &mut surface, &mut history)
            .unwrap();
        assert_eq!(surface.read_pixel(16, 16), Some(Rgba8::TRANSPARENT));
        assert_eq!(surface.read_pixel(30, 30), Some(RED));
    }

    #[test]
    fn test_drawing_clears_redo() {
        let (mut replay, mut surface, mut history) = setup();
        replay
            .apply(&Part::drawing(&pts(&[(1.0, 1.0)]), style(), true), &mut surface, &mut history)
            .unwrap();
        replay.apply(&Part::undo(), &mut surface, &mut history).unwrap();
        assert!(history.can_redo());
        replay
            .apply(&Part::drawing(&pts(&[(2.0, 2.0)]), style(), false), &mut surface, &mut history)
            .unwrap();
        assert!(!history.can_redo());
    }
}
