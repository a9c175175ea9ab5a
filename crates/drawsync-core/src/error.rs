//! Engine errors.

use crate::part::PartKind;
use thiserror::Error;

/// Why a part was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PartDefect {
    #[error("{0:?} part carries no coordinates")]
    MissingCoordinates(PartKind),
    #[error("coordinate list has odd length {0}")]
    OddCoordinateCount(usize),
    #[error("fill part must carry exactly one point, got {0}")]
    FillPointCount(usize),
    #[error("{0:?} part must not carry coordinates")]
    UnexpectedCoordinates(PartKind),
    #[error("coordinate at index {0} is not finite")]
    NonFiniteCoordinate(usize),
    #[error("stroke width {0} is not a positive number")]
    InvalidStrokeWidth(f32),
    #[error("alpha {0} is outside [0, 1]")]
    AlphaOutOfRange(f32),
}

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid part: {0}")]
    InvalidPart(#[from] PartDefect),
    #[error("Failed to decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
