//! Snapshot-based undo/redo over the whole surface.
//!
//! `past` always ends with a capture of what is currently displayed, so undo
//! drops that top entry and shows the one beneath it. The first capture is
//! taken at construction and can never be undone.

use crate::surface::{PixelSurface, Snapshot};

/// Maximum number of snapshots kept in `past`.
pub const MAX_HISTORY: usize = 20;

/// Bounded undo/redo stacks of full-surface snapshots.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    past: Vec<Snapshot>,
    future: Vec<Snapshot>,
    capacity: usize,
}

impl HistoryStack {
    /// Create a history seeded with the current state of `surface`.
    pub fn new<S: PixelSurface + ?Sized>(surface: &S) -> Self {
        Self::with_capacity(surface, MAX_HISTORY)
    }

    /// Like [`HistoryStack::new`] with a custom bound for `past` (at least 1).
    pub fn with_capacity<S: PixelSurface + ?Sized>(surface: &S, capacity: usize) -> Self {
        let mut history = Self {
            past: Vec::new(),
            future: Vec::new(),
            capacity: capacity.max(1),
        };
        history.record(surface);
        history
    }

    /// Push a capture of the current surface, evicting the oldest past the bound.
    pub fn record<S: PixelSurface + ?Sized>(&mut self, surface: &S) {
        self.push_past(surface.capture());
    }

    fn push_past(&mut self, snapshot: Snapshot) {
        self.past.push(snapshot);
        if self.past.len() > self.capacity {
            let excess = self.past.len() - self.capacity;
            self.past.drain(..excess);
        }
    }

    /// Step back one recorded state.
    ///
    /// Returns `false` without touching the surface when fewer than two
    /// states are recorded.
    pub fn undo<S: PixelSurface + ?Sized>(&mut self, surface: &mut S) -> bool {
        if self.past.len() < 2 {
            return false;
        }
        self.future.push(surface.capture());
        self.past.pop();
        match self.past.last() {
            Some(previous) => {
                surface.restore(previous);
                true
            }
            None => false,
        }
    }

    /// Re-apply the most recently undone state.
    ///
    /// Returns `false` without touching the surface when nothing was undone.
    pub fn redo<S: PixelSurface + ?Sized>(&mut self, surface: &mut S) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        self.push_past(surface.capture());
        surface.restore(&next);
        true
    }

    /// Drop redo history. Called on every new edit.
    pub fn clear_future(&mut self) {
        self.future.clear();
    }

    /// Forget everything and re-seed from the current surface.
    pub fn reset<S: PixelSurface + ?Sized>(&mut self, surface: &S) {
        self.past.clear();
        self.future.clear();
        self.record(surface);
    }

    pub fn can_undo(&self) -> bool {
        self.past.len() >= 2
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
