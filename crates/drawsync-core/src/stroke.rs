//! Batching of local pointer strokes into drawing parts.
//!
//! Local drawing is never throttled: every pointer move yields a segment to
//! draw right away. Only part emission is rate limited, by comparing the time
//! since the last flush against the gesture's flush interval on each move.

use crate::gesture::{GestureState, StrokeStyle};
use crate::part::Part;
use kurbo::Point;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};
#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// What the engine should do after feeding the batcher one pointer event.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStep {
    /// Segment start; `None` for the initial dot of a stroke.
    pub from: Option<Point>,
    pub to: Point,
    pub style: StrokeStyle,
    /// A part to emit, if the flush interval elapsed.
    pub part: Option<Part>,
}

#[derive(Debug, Clone)]
struct OpenStroke {
    style: StrokeStyle,
    flush_interval: Duration,
    /// Points not yet sent.
    pending: Vec<Point>,
    cursor: Point,
}

/// Turns one local gesture into a sequence of drawing parts.
#[derive(Debug, Clone, Default)]
pub struct StrokeBatcher {
    stroke: Option<OpenStroke>,
    last_flush: Option<Instant>,
}

impl StrokeBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.stroke.is_some()
    }

    /// Style of the open stroke, fixed at pointer-down.
    pub fn style(&self) -> Option<StrokeStyle> {
        self.stroke.as_ref().map(|stroke| stroke.style)
    }

    /// Number of buffered points not yet sent.
    pub fn pending_len(&self) -> usize {
        self.stroke.as_ref().map_or(0, |stroke| stroke.pending.len())
    }

    /// Open a stroke at `point`, replacing any stroke still open.
    pub fn begin(&mut self, point: Point, gesture: &GestureState) -> StrokeStep {
        self.stroke = Some(OpenStroke {
            style: gesture.style,
            flush_interval: gesture.flush_interval,
            pending: vec![point],
            cursor: point,
        });
        StrokeStep {
            from: None,
            to: point,
            style: gesture.style,
            part: None,
        }
    }

    /// Extend the open stroke. Returns `None` when no stroke is open.
    pub fn extend(&mut self, point: Point, now: Instant) -> Option<StrokeStep> {
        let stroke = self.stroke.as_mut()?;
        let from = stroke.cursor;
        stroke.cursor = point;
        stroke.pending.push(point);

        let due = self
            .last_flush
            .is_none_or(|last| now.saturating_duration_since(last) >= stroke.flush_interval);
        let style = stroke.style;
        let part = due.then(|| self.flush(now, false)).flatten();
        Some(StrokeStep {
            from: Some(from),
            to: point,
            style,
            part,
        })
    }

    /// Close the open stroke and return its final part.
    ///
    /// The final part is produced even when no points are pending, so the
    /// receiver always sees the gesture end.
    pub fn finish(&mut self, now: Instant) -> Option<Part> {
        let part = self.flush(now, true);
        self.stroke = None;
        part
    }

    /// Drop the open stroke without producing a part.
    pub fn discard(&mut self) {
        self.stroke = None;
    }

    fn flush(&mut self, now: Instant, is_gesture_end: bool) -> Option<Part> {
        let stroke = self.stroke.as_mut()?;
        let points = std::mem::take(&mut stroke.pending);
        self.last_flush = Some(now);
        Some(Part::drawing(&points, stroke.style, is_gesture_end))
    }
}
