//! Engine configuration.

use crate::color::Rgba;
use crate::error::{EngineError, EngineResult};
use crate::gesture::{DEFAULT_FLUSH_RATE_HZ, DrawMode, GestureState, StrokeStyle, flush_interval_for};
use crate::history::MAX_HISTORY;
use crate::part::DEFAULT_STROKE_WIDTH;
use serde::{Deserialize, Serialize};

/// Initial settings for a [`DrawingEngine`](crate::DrawingEngine).
///
/// Missing fields take their defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bound on undo snapshots.
    pub max_history: usize,
    /// How often an in-progress stroke is sent, in parts per second.
    pub flush_rate_hz: u32,
    pub stroke_width: f32,
    pub color: Rgba,
    pub mode: DrawMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history: MAX_HISTORY,
            flush_rate_hz: DEFAULT_FLUSH_RATE_HZ,
            stroke_width: DEFAULT_STROKE_WIDTH,
            color: Rgba::black(),
            mode: DrawMode::Drawing,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.max_history == 0 {
            return Err(EngineError::InvalidConfig(
                "max_history must be at least 1".to_string(),
            ));
        }
        if self.flush_rate_hz == 0 {
            return Err(EngineError::InvalidConfig(
                "flush_rate_hz must be at least 1".to_string(),
            ));
        }
        if !(self.stroke_width.is_finite() && self.stroke_width > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "stroke_width {} is not a positive number",
                self.stroke_width
            )));
        }
        if !self.color.has_valid_alpha() {
            return Err(EngineError::InvalidConfig(format!(
                "color alpha {} is outside [0, 1]",
                self.color.a
            )));
        }
        Ok(())
    }

    /// Gesture settings this config starts the engine with.
    pub fn gesture_state(&self) -> GestureState {
        GestureState {
            mode: self.mode,
            style: StrokeStyle::new(self.color, self.stroke_width),
            flush_interval: flush_interval_for(self.flush_rate_hz),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_history, 20);
        assert_eq!(config.flush_rate_hz, 30);
        assert!(config.validate().is_ok());
        assert_eq!(config.gesture_state(), GestureState::default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"flush_rate_hz": 60, "color": [255, 0, 0, 1.0]}"#).unwrap();
        assert_eq!(config.flush_rate_hz, 60);
        assert_eq!(config.color, Rgba::new(255, 0, 0, 1.0));
        assert_eq!(config.max_history, MAX_HISTORY);
        assert_eq!(config.mode, DrawMode::Drawing);
    }

    #[test]
    fn test_mode_from_json() {
        let config = EngineConfig::from_json(r#"{"mode": "filling"}"#).unwrap();
        assert_eq!(config.mode, DrawMode::Filling);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"max_history": 0}"#),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"flush_rate_hz": 0}"#),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"stroke_width": -1.0}"#),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(EngineError::Decode(_))
        ));
    }
}
