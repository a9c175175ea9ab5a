//! DrawSync Core Library
//!
//! Platform-agnostic drawing engine for the DrawSync shared whiteboard:
//! local strokes and fills become replayable parts, remote parts are drawn
//! onto a pixel surface, and a bounded snapshot history backs undo/redo.

pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod fill;
pub mod gesture;
pub mod history;
pub mod part;
pub mod protocol;
pub mod raster;
pub mod replay;
pub mod session;
pub mod stroke;
pub mod surface;

pub use color::{Rgba, Rgba8};
pub use config::EngineConfig;
pub use engine::{DrawingEngine, EditPermission, PartDisposition};
pub use error::{EngineError, EngineResult, PartDefect};
pub use fill::flood_fill;
pub use gesture::{DrawMode, GestureState, StrokeStyle};
pub use history::{HistoryStack, MAX_HISTORY};
pub use part::{Part, PartKind};
pub use protocol::{ClientMessage, ServerMessage};
pub use raster::RasterSurface;
pub use replay::{ReplayEngine, ReplayState};
pub use session::{Session, SessionEvent};
pub use stroke::StrokeBatcher;
pub use surface::{PixelBuffer, PixelSurface, Snapshot};
