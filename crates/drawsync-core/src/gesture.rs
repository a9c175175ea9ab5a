//! Local tool settings handed to the stroke batcher and fill engine.

use crate::color::Rgba;
use crate::part::DEFAULT_STROKE_WIDTH;
use serde::{Deserialize, Serialize};

#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;
#[cfg(target_arch = "wasm32")]
use web_time::Duration;

/// Default part flush rate for in-progress strokes.
pub const DEFAULT_FLUSH_RATE_HZ: u32 = 30;

/// What a pointer-down does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    #[default]
    Drawing,
    Filling,
}

/// Color and width of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub width: f32,
}

impl StrokeStyle {
    pub const fn new(color: Rgba, width: f32) -> Self {
        Self { color, width }
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::new(Rgba::black(), DEFAULT_STROKE_WIDTH)
    }
}

/// Flush interval for a rate in hertz, rounded to whole milliseconds.
pub fn flush_interval_for(rate_hz: u32) -> Duration {
    let rate = u64::from(rate_hz.max(1));
    Duration::from_millis((1000 + rate / 2) / rate)
}

/// Immutable snapshot of the local tool settings.
///
/// The engine swaps in a new value on every setter call, so components that
/// captured a state at gesture start are unaffected by later changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureState {
    pub mode: DrawMode,
    pub style: StrokeStyle,
    pub flush_interval: Duration,
}

impl GestureState {
    pub fn with_mode(self, mode: DrawMode) -> Self {
        Self { mode, ..self }
    }

    pub fn with_color(self, color: Rgba) -> Self {
        Self {
            style: StrokeStyle::new(color, self.style.width),
            ..self
        }
    }

    pub fn with_stroke_width(self, width: f32) -> Self {
        Self {
            style: StrokeStyle::new(self.style.color, width),
            ..self
        }
    }

    pub fn with_flush_interval(self, flush_interval: Duration) -> Self {
        Self {
            flush_interval,
            ..self
        }
    }
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            mode: DrawMode::default(),
            style: StrokeStyle::default(),
            flush_interval: flush_interval_for(DEFAULT_FLUSH_RATE_HZ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_interval_rounding() {
        assert_eq!(flush_interval_for(30), Duration::from_millis(33));
        assert_eq!(flush_interval_for(60), Duration::from_millis(17));
        assert_eq!(flush_interval_for(1000), Duration::from_millis(1));
        assert_eq!(flush_interval_for(0), Duration::from_millis(1000));
    }

    #[test]
    fn test_builders_leave_other_fields() {
        let state = GestureState::default()
            .with_color(Rgba::new(9, 9, 9, 0.5))
            .with_stroke_width(7.0)
            .with_mode(DrawMode::Filling);
        assert_eq!(state.mode, DrawMode::Filling);
        assert_eq!(state.style, StrokeStyle::new(Rgba::new(9, 9, 9, 0.5), 7.0));
        assert_eq!(state.flush_interval, Duration::from_millis(33));
    }
}
