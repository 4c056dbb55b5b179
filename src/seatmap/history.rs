//! Linear undo/redo over deep snapshots of the seat list. Only seat
//! geometry is versioned; selections and the view transform are not.

use crate::models::Seat;

pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Vec<Seat>>,
    cursor: usize,
    capacity: usize,
}

impl History {
    pub fn new(initial: Vec<Seat>) -> History {
        History::with_capacity(initial, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(initial: Vec<Seat>, capacity: usize) -> History {
        History {
            snapshots: vec![initial],
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// The snapshot the cursor currently points at.
    pub fn current(&self) -> &[Seat] {
        &self.snapshots[self.cursor]
    }

    /// Record the state after a structural change. Any redo tail beyond
    /// the cursor is discarded (standard linear history truncation), and
    /// the oldest snapshot is dropped once the bound is exceeded.
    pub fn record(&mut self, seats: Vec<Seat>) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(seats);
        if self.snapshots.len() > self.capacity + 1 {
            self.snapshots.remove(0);
        }
        self.cursor = self.snapshots.len() - 1;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn undo(&mut self) -> Option<Vec<Seat>> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.snapshots[self.cursor].clone())
    }

    pub fn redo(&mut self) -> Option<Vec<Seat>> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.snapshots[self.cursor].clone())
    }

    /// Replace the whole history with a fresh baseline, e.g. after loading
    /// a layout from the backend.
    pub fn reset(&mut self, seats: Vec<Seat>) {
        self.snapshots = vec![seats];
        self.cursor = 0;
    }
}
