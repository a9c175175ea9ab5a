//! Drawing engine: local input in, parts out; remote parts in, pixels out.
//!
//! The engine owns the surface, the undo history and the local tool
//! settings. Exactly one side may mutate the surface at a time: with local
//! editing enabled, pointer input is drawn and remote parts are ignored;
//! with it disabled, pointer input is ignored and remote parts are replayed.

use crate::color::Rgba;
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::fill::fill_surface;
use crate::gesture::{DrawMode, GestureState, flush_interval_for};
use crate::history::HistoryStack;
use crate::part::Part;
use crate::replay::{ReplayEngine, ReplayState};
use crate::stroke::{StrokeBatcher, StrokeStep};
use crate::surface::PixelSurface;
use kurbo::Point;
use std::sync::mpsc::{Receiver, Sender, channel};

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};
#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Who may currently mutate the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditPermission {
    /// Local pointer input is drawn; remote parts are ignored.
    #[default]
    Local,
    /// Remote parts are applied; local pointer input is ignored.
    Remote,
}

/// What [`DrawingEngine::put_part`] did with a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartDisposition {
    Applied,
    /// Local editing is enabled, so remote parts are not applied.
    Ignored,
}

/// The whiteboard engine for one participant.
pub struct DrawingEngine<S: PixelSurface> {
    surface: S,
    history: HistoryStack,
    replay: ReplayEngine,
    batcher: StrokeBatcher,
    gesture: GestureState,
    default_mode: DrawMode,
    permission: EditPermission,
    listeners: Vec<Sender<Part>>,
}

impl<S: PixelSurface> DrawingEngine<S> {
    /// Create an engine over `surface` with default settings.
    pub fn new(surface: S) -> Self {
        let config = EngineConfig::default();
        let history = HistoryStack::with_capacity(&surface, config.max_history);
        Self::assemble(surface, history, &config)
    }

    /// Create an engine from a validated config.
    pub fn with_config(surface: S, config: &EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let history = HistoryStack::with_capacity(&surface, config.max_history);
        Ok(Self::assemble(surface, history, config))
    }

    fn assemble(surface: S, history: HistoryStack, config: &EngineConfig) -> Self {
        Self {
            surface,
            history,
            replay: ReplayEngine::new(),
            batcher: StrokeBatcher::new(),
            gesture: config.gesture_state(),
            default_mode: config.mode,
            permission: EditPermission::Local,
            listeners: Vec::new(),
        }
    }

    // --- Accessors ---

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Give back the surface, dropping history and listeners.
    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn gesture(&self) -> GestureState {
        self.gesture
    }

    pub fn mode(&self) -> DrawMode {
        self.gesture.mode
    }

    pub fn color(&self) -> Rgba {
        self.gesture.style.color
    }

    pub fn stroke_width(&self) -> f32 {
        self.gesture.style.width
    }

    pub fn flush_interval(&self) -> Duration {
        self.gesture.flush_interval
    }

    pub fn permission(&self) -> EditPermission {
        self.permission
    }

    pub fn can_edit_locally(&self) -> bool {
        self.permission == EditPermission::Local
    }

    pub fn replay_state(&self) -> ReplayState {
        self.replay.state()
    }

    /// Whether a local stroke is in progress.
    pub fn is_stroking(&self) -> bool {
        self.batcher.is_open()
    }

    // --- Settings ---

    /// Switch tools. An open stroke is finished first.
    pub fn set_mode(&mut self, mode: DrawMode) {
        if mode != self.gesture.mode {
            self.finish_stroke(Instant::now());
        }
        self.gesture = self.gesture.with_mode(mode);
    }

    /// Set the local color. Colors with alpha outside `[0, 1]` are ignored.
    pub fn set_color(&mut self, color: Rgba) {
        if !color.has_valid_alpha() {
            log::warn!("ignoring color with alpha {}", color.a);
            return;
        }
        self.gesture = self.gesture.with_color(color);
    }

    /// Set the local stroke width. Non-positive widths are ignored.
    pub fn set_stroke_width(&mut self, width: f32) {
        if !(width.is_finite() && width > 0.0) {
            log::warn!("ignoring stroke width {width}");
            return;
        }
        self.gesture = self.gesture.with_stroke_width(width);
    }

    /// Set how many stroke parts per second are sent. Zero is ignored.
    pub fn set_flush_rate_hz(&mut self, rate_hz: u32) {
        if rate_hz == 0 {
            log::warn!("ignoring flush rate of 0 Hz");
            return;
        }
        self.gesture = self.gesture.with_flush_interval(flush_interval_for(rate_hz));
    }

    // --- Edit permission ---

    /// Accept local pointer input; remote parts are ignored from now on.
    ///
    /// A remote stroke still open is closed first.
    pub fn enable_local_editing(&mut self) {
        self.close_remote_stroke();
        self.permission = EditPermission::Local;
    }

    /// Close a remote stroke whose author will send no more parts.
    ///
    /// The partial stroke is recorded for undo and the next remote drawing
    /// part starts a new path. Returns `false` if no remote stroke was open.
    pub fn close_remote_stroke(&mut self) -> bool {
        self.replay.close_stroke(&mut self.surface, &mut self.history)
    }

    /// Stop accepting local input and start applying remote parts.
    ///
    /// A local stroke in progress is finished and sent.
    pub fn disable_local_editing(&mut self) {
        self.finish_stroke(Instant::now());
        self.permission = EditPermission::Remote;
    }

    // --- Part output ---

    /// Register a channel that receives every part this engine produces.
    pub fn on_part_produced(&mut self) -> Receiver<Part> {
        let (tx, rx) = channel();
        self.listeners.push(tx);
        rx
    }

    fn emit(&mut self, part: Part) {
        log::debug!(
            "emitting {:?} part ({} coordinates, end = {})",
            part.kind(),
            part.coordinates().len(),
            part.is_gesture_end()
        );
        // Receivers that were dropped are forgotten.
        self.listeners.retain(|tx| tx.send(part.clone()).is_ok());
    }

    // --- Remote input ---

    /// Apply a part received from the remote author.
    ///
    /// Ignored while local editing is enabled. Malformed parts are rejected
    /// without touching the surface.
    pub fn put_part(&mut self, part: &Part) -> EngineResult<PartDisposition> {
        if self.can_edit_locally() {
            log::debug!("ignoring remote {:?} part: local editing enabled", part.kind());
            return Ok(PartDisposition::Ignored);
        }
        if let Err(err) = self.replay.apply(part, &mut self.surface, &mut self.history) {
            log::warn!("rejected remote part: {err}");
            return Err(err);
        }
        Ok(PartDisposition::Applied)
    }

    // --- Local pointer input ---

    pub fn pointer_down(&mut self, point: Point) {
        self.pointer_down_at(point, Instant::now());
    }

    pub fn pointer_move(&mut self, point: Point) {
        self.pointer_move_at(point, Instant::now());
    }

    pub fn pointer_up(&mut self) {
        self.pointer_up_at(Instant::now());
    }

    /// Pointer left the surface; ends the stroke like a pointer-up.
    pub fn pointer_leave(&mut self) {
        self.pointer_up_at(Instant::now());
    }

    /// Pointer-down at a given time.
    pub fn pointer_down_at(&mut self, point: Point, now: Instant) {
        if !self.can_edit_locally() {
            return;
        }
        self.finish_stroke(now);
        self.history.clear_future();

        match self.gesture.mode {
            DrawMode::Filling => {
                let color = self.gesture.style.color;
                fill_surface(&mut self.surface, point, color);
                self.surface.flush_pixels();
                self.emit(Part::fill(color, point));
                self.history.record(&self.surface);
            }
            DrawMode::Drawing => {
                let step = self.batcher.begin(point, &self.gesture);
                self.draw_step(step);
            }
        }
    }

    /// Pointer-move at a given time.
    pub fn pointer_move_at(&mut self, point: Point, now: Instant) {
        if !self.can_edit_locally() {
            return;
        }
        if let Some(step) = self.batcher.extend(point, now) {
            self.draw_step(step);
        }
    }

    /// Pointer-up at a given time.
    pub fn pointer_up_at(&mut self, now: Instant) {
        if !self.can_edit_locally() {
            return;
        }
        self.finish_stroke(now);
    }

    fn draw_step(&mut self, step: StrokeStep) {
        self.surface.stroke_segment(step.from, &[step.to], &step.style);
        self.surface.flush_pixels();
        if let Some(part) = step.part {
            self.emit(part);
        }
    }

    /// Send the final part of an open stroke and record it.
    fn finish_stroke(&mut self, now: Instant) {
        if let Some(part) = self.batcher.finish(now) {
            self.emit(part);
            self.history.record(&self.surface);
            self.history.clear_future();
        }
    }

    // --- History and board actions ---

    /// Undo the last recorded edit; peers are told to do the same.
    ///
    /// Returns `false` (and sends nothing) when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.finish_stroke(Instant::now());
        if !self.history.undo(&mut self.surface) {
            return false;
        }
        self.surface.flush_pixels();
        self.emit(Part::undo());
        true
    }

    /// Redo the last undone edit; peers are told to do the same.
    ///
    /// Returns `false` (and sends nothing) when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        self.finish_stroke(Instant::now());
        if !self.history.redo(&mut self.surface) {
            return false;
        }
        self.surface.flush_pixels();
        self.emit(Part::redo());
        true
    }

    /// Clear the board and tell peers to do the same.
    pub fn clear(&mut self) {
        self.finish_stroke(Instant::now());
        self.history.clear_future();
        self.surface.clear();
        self.surface.flush_pixels();
        self.history.record(&self.surface);
        self.emit(Part::clear());
    }

    /// Back to a blank board: history re-seeded, remote stroke forgotten,
    /// local editing enabled and the configured default mode restored.
    ///
    /// Nothing is sent; buffered stroke points are dropped.
    pub fn reset(&mut self) {
        self.batcher.discard();
        self.replay.reset();
        self.surface.clear();
        self.surface.flush_pixels();
        self.history.reset(&self.surface);
        self.permission = EditPermission::Local;
        self.gesture = self.gesture.with_mode(self.default_mode);
    }
}
