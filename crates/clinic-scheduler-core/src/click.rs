//! Single/double click disambiguation for grid cells.
//!
//! A click-tracking state machine, scoped to one cell at a time:
//!
//! ```text
//! Idle --click(A)--> Armed(A, t0)            emits Create
//! Armed(A, t0) --click(A), now - t0 < window--> Idle   emits Inspect (or None on an empty cell)
//! Armed(A, t0) --click(A), window elapsed-->  Armed(A, now)   emits Create
//! Armed(A, t0) --click(B)-->                  Armed(B, now)   emits Create
//! ```
//!
//! The first click is acted on immediately (the booking form opens
//! optimistically), so a double click produces `Create` then `Inspect`.
//! Timestamps are supplied by the caller in epoch milliseconds.

use serde::{Deserialize, Serialize};

use crate::slot::Cell;

/// Default double-click window.
pub const DOUBLE_CLICK_WINDOW_MS: u64 = 300;

/// What the UI should do with a pointer-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickIntent {
    /// Open the new-booking form.
    Create,
    /// Open the details of the sessions in the cell.
    Inspect,
    /// Nothing to do.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ClickState {
    Idle,
    Armed { cell: Cell, at_ms: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickDisambiguator {
    window_ms: u64,
    state: ClickState,
}

impl ClickDisambiguator {
    /// A window of zero is raised to one millisecond.
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms: window_ms.max(1),
            state: ClickState::Idle,
        }
    }

    pub fn state(&self) -> ClickState {
        self.state
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Classify a pointer-down on `cell`.
    ///
    /// `occupied` is whether the cell currently holds at least one session.
    pub fn on_pointer_down(&mut self, cell: Cell, now_ms: u64, occupied: bool) -> ClickIntent {
        if self.is_second_click(cell, now_ms) {
            self.state = ClickState::Idle;
            return if occupied {
                ClickIntent::Inspect
            } else {
                ClickIntent::None
            };
        }

        self.state = ClickState::Armed { cell, at_ms: now_ms };
        ClickIntent::Create
    }

    /// Drop a stale arm. Returns `true` if the state changed.
    ///
    /// Optional: a stale arm already fails the window check on the next
    /// click, this only keeps [`ClickDisambiguator::state`] tidy for timers.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        match self.state {
            ClickState::Armed { at_ms, .. } if !self.within_window(at_ms, now_ms) => {
                self.state = ClickState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.state = ClickState::Idle;
    }

    fn is_second_click(&self, cell: Cell, now_ms: u64) -> bool {
        match self.state {
            ClickState::Armed {
                cell: armed,
                at_ms,
            } => armed == cell && self.within_window(at_ms, now_ms),
            ClickState::Idle => false,
        }
    }

    // A clock that went backwards never counts as a double click.
    fn within_window(&self, at_ms: u64, now_ms: u64) -> bool {
        now_ms
            .checked_sub(at_ms)
            .is_some_and(|elapsed| elapsed < self.window_ms)
    }
}

impl Default for ClickDisambiguator {
    fn default() -> Self {
        Self::new(DOUBLE_CLICK_WINDOW_MS)
    }
}
