//! Parts: the replayable unit of drawing intent exchanged between peers.
//!
//! A part is immutable once built. It has no identity or timestamp; peers
//! apply parts in the order they are delivered.
//!
//! Wire shape (JSON):
//! ```json
//! { "kind": "drawing", "isGestureEnd": false, "coordinates": [10, 10, 20, 20],
//!   "color": [0, 0, 0, 1.0], "strokeWidth": 2.0 }
//! ```

use crate::color::Rgba;
use crate::error::{EngineResult, PartDefect};
use crate::gesture::StrokeStyle;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Default stroke width carried by parts that do not draw.
pub const DEFAULT_STROKE_WIDTH: f32 = 2.0;

/// Kind of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Drawing,
    Filling,
    Undo,
    Redo,
    Clear,
}

/// A single unit of drawing intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    kind: PartKind,
    /// Set on the last part of a stroke. Only meaningful for drawings.
    #[serde(default)]
    is_gesture_end: bool,
    /// Flattened `[x0, y0, x1, y1, ...]`.
    #[serde(default)]
    coordinates: Vec<f64>,
    #[serde(default)]
    color: Rgba,
    #[serde(default = "default_stroke_width")]
    stroke_width: f32,
}

fn default_stroke_width() -> f32 {
    DEFAULT_STROKE_WIDTH
}

impl Part {
    /// Build a part from raw fields, e.g. after decoding from another transport.
    ///
    /// No validation happens here; see [`Part::validate`].
    pub fn from_raw(
        kind: PartKind,
        is_gesture_end: bool,
        coordinates: Vec<f64>,
        color: Rgba,
        stroke_width: f32,
    ) -> Self {
        Self {
            kind,
            is_gesture_end,
            coordinates,
            color,
            stroke_width,
        }
    }

    fn bare(kind: PartKind) -> Self {
        Self::from_raw(kind, false, Vec::new(), Rgba::black(), DEFAULT_STROKE_WIDTH)
    }

    /// A stroke fragment through `points`.
    pub fn drawing(points: &[Point], style: StrokeStyle, is_gesture_end: bool) -> Self {
        let coordinates = points.iter().flat_map(|p| [p.x, p.y]).collect();
        Self::from_raw(
            PartKind::Drawing,
            is_gesture_end,
            coordinates,
            style.color,
            style.width,
        )
    }

    /// A flood fill seeded at `seed`.
    pub fn fill(color: Rgba, seed: Point) -> Self {
        Self::from_raw(
            PartKind::Filling,
            false,
            vec![seed.x, seed.y],
            color,
            DEFAULT_STROKE_WIDTH,
        )
    }

    pub fn clear() -> Self {
        Self::bare(PartKind::Clear)
    }

    pub fn undo() -> Self {
        Self::bare(PartKind::Undo)
    }

    pub fn redo() -> Self {
        Self::bare(PartKind::Redo)
    }

    pub fn kind(&self) -> PartKind {
        self.kind
    }

    pub fn is_gesture_end(&self) -> bool {
        self.is_gesture_end
    }

    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    /// Coordinate pairs as points. A trailing unpaired value is skipped.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.coordinates
            .chunks_exact(2)
            .map(|pair| Point::new(pair[0], pair[1]))
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    /// Color and width as a stroke style.
    pub fn style(&self) -> StrokeStyle {
        StrokeStyle::new(self.color, self.stroke_width)
    }

    /// Check coordinate arity and style for this part's kind.
    pub fn validate(&self) -> Result<(), PartDefect> {
        let len = self.coordinates.len();
        if let Some(index) = self.coordinates.iter().position(|c| !c.is_finite()) {
            return Err(PartDefect::NonFiniteCoordinate(index));
        }
        match self.kind {
            PartKind::Drawing | PartKind::Filling => {
                // An empty drawing part is only a gesture terminator.
                let terminator = self.kind == PartKind::Drawing && self.is_gesture_end;
                if len == 0 && !terminator {
                    return Err(PartDefect::MissingCoordinates(self.kind));
                }
                if len % 2 != 0 {
                    return Err(PartDefect::OddCoordinateCount(len));
                }
                if self.kind == PartKind::Filling && len != 2 {
                    return Err(PartDefect::FillPointCount(len / 2));
                }
                if self.kind == PartKind::Drawing
                    && !(self.stroke_width.is_finite() && self.stroke_width > 0.0)
                {
                    return Err(PartDefect::InvalidStrokeWidth(self.stroke_width));
                }
                if !self.color.has_valid_alpha() {
                    return Err(PartDefect::AlphaOutOfRange(self.color.a));
                }
            }
            PartKind::Undo | PartKind::Redo | PartKind::Clear => {
                if len != 0 {
                    return Err(PartDefect::UnexpectedCoordinates(self.kind));
                }
            }
        }
        Ok(())
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON. The result is not validated.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
