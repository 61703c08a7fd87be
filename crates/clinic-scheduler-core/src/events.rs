use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::slot::Cell;

/// Every committed change to the grid produces an Event.
/// Collaborators (billing, evaluation marking, notifications) consume them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionBooked {
        session_id: String,
        professional_id: String,
        cell: Cell,
        /// The cell had already started when it was booked.
        is_past: bool,
        at: NaiveDateTime,
    },
    /// A recurring series was submitted; some occurrences may be skipped.
    SeriesSubmitted {
        recurrence_id: Option<String>,
        committed: usize,
        skipped: usize,
        at: NaiveDateTime,
    },
    SessionRescheduled {
        session_id: String,
        from: Cell,
        to: Cell,
        is_past: bool,
        at: NaiveDateTime,
    },
    SessionRemoved {
        session_id: String,
        cell: Cell,
        at: NaiveDateTime,
    },
}
