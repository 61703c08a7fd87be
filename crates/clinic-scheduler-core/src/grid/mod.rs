//! Slot grid: the authoritative store of booked sessions.
//!
//! Sessions are keyed by [`Cell`]. Every mutating call checks the two grid
//! invariants before touching state:
//!
//! - a cell holds at most `capacity` sessions (default [`MAX_CAPACITY`])
//! - a professional holds at most one session per cell
//!
//! A rejected call leaves the grid exactly as it was. [`SharedGrid`] wraps
//! the grid for callers that need a single-writer handle.

mod shared;

pub use shared::SharedGrid;

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::SchedulingError;
use crate::session::Session;
use crate::slot::{Cell, SlotTable, TimeSlot};

/// Simultaneous sessions a cell may hold (shared rooms and staff).
pub const MAX_CAPACITY: usize = 3;

/// In-memory grid of sessions.
#[derive(Debug, Clone)]
pub struct SlotGrid {
    slots: SlotTable,
    capacity: usize,
    sessions: HashMap<String, Session>,
    /// Session ids per cell, in booking order.
    cells: BTreeMap<Cell, Vec<String>>,
}

impl SlotGrid {
    /// Create an empty grid. Capacity is clamped to `1..=MAX_CAPACITY`.
    pub fn new(slots: SlotTable, capacity: usize) -> Self {
        Self {
            slots,
            capacity: capacity.clamp(1, MAX_CAPACITY),
            sessions: HashMap::new(),
            cells: BTreeMap::new(),
        }
    }

    /// Rebuild a grid from stored sessions.
    ///
    /// Each session goes through [`SlotGrid::insert`]; the ones that would
    /// break an invariant are returned alongside the grid instead of loaded.
    pub fn from_sessions(
        slots: SlotTable,
        capacity: usize,
        sessions: impl IntoIterator<Item = Session>,
    ) -> (Self, Vec<(Session, SchedulingError)>) {
        let mut grid = Self::new(slots, capacity);
        let mut rejected = Vec::new();
        for session in sessions {
            if let Err(err) = grid.insert(session.clone()) {
                rejected.push((session, err));
            }
        }
        (grid, rejected)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Total sessions in the cell, any professional.
    pub fn occupancy_of(&self, date: NaiveDate, time_slot: TimeSlot) -> usize {
        self.cells
            .get(&Cell::new(date, time_slot))
            .map_or(0, |ids| ids.len())
    }

    /// Sessions in the cell belonging to one professional (0 or 1).
    pub fn occupancy_of_professional(
        &self,
        date: NaiveDate,
        time_slot: TimeSlot,
        professional_id: &str,
    ) -> usize {
        self.sessions_in(Cell::new(date, time_slot))
            .filter(|s| s.professional_id == professional_id)
            .count()
    }

    /// Sessions in one cell, in booking order.
    pub fn sessions_in(&self, cell: Cell) -> impl Iterator<Item = &Session> + '_ {
        self.cells
            .get(&cell)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.sessions.get(id))
    }

    /// Every session, ordered by cell.
    pub fn iter(&self) -> impl Iterator<Item = &Session> + '_ {
        self.cells
            .values()
            .flatten()
            .filter_map(move |id| self.sessions.get(id))
    }

    /// Sessions on one date, ordered by slot.
    pub fn sessions_on(&self, date: NaiveDate) -> Vec<&Session> {
        self.cells
            .range(Cell::new(date, TimeSlot::MIDNIGHT)..)
            .take_while(|(cell, _)| cell.date == date)
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(move |id| self.sessions.get(id))
            .collect()
    }

    pub fn sessions_for_professional(&self, professional_id: &str) -> Vec<&Session> {
        self.iter()
            .filter(|s| s.professional_id == professional_id)
            .collect()
    }

    /// Sessions sharing a recurrence id, chronological.
    pub fn series(&self, recurrence_id: &str) -> Vec<&Session> {
        self.iter()
            .filter(|s| s.recurrence_id.as_deref() == Some(recurrence_id))
            .collect()
    }

    /// Check whether a booking for `professional_id` fits in `cell`.
    ///
    /// With `professional_id` unset only capacity is checked. `ignore` names
    /// a session whose current occupancy should not count, used when a
    /// session is checked against its own cell. This is the one placement
    /// predicate; inserts, moves and the availability resolver all use it.
    pub fn check_cell(
        &self,
        cell: Cell,
        professional_id: Option<&str>,
        ignore: Option<&str>,
    ) -> Result<(), SchedulingError> {
        self.slots.ensure(cell.time_slot)?;

        let mut total = 0;
        let mut same_professional = false;
        for other in self.sessions_in(cell) {
            if Some(other.id.as_str()) == ignore {
                continue;
            }
            total += 1;
            same_professional |= Some(other.professional_id.as_str()) == professional_id;
        }

        if total >= self.capacity {
            return Err(SchedulingError::CapacityExceeded {
                date: cell.date,
                time_slot: cell.time_slot,
                capacity: self.capacity,
            });
        }
        if same_professional {
            return Err(SchedulingError::ProfessionalDoubleBooked {
                professional_id: professional_id.unwrap_or_default().to_string(),
                date: cell.date,
                time_slot: cell.time_slot,
            });
        }
        Ok(())
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Book a session into its cell.
    ///
    /// # Errors
    /// `CapacityExceeded`, `ProfessionalDoubleBooked`, `UnknownTimeSlot` or
    /// `DuplicateSession`; the grid is unchanged on error.
    pub fn insert(&mut self, session: Session) -> Result<Session, SchedulingError> {
        if self.sessions.contains_key(&session.id) {
            return Err(SchedulingError::DuplicateSession(session.id));
        }
        let professional = Some(session.professional_id.as_str());
        if let Err(err) = self.check_cell(session.cell(), professional, None) {
            warn!(
                session_id = %session.id,
                cell = %session.cell(),
                reason = %err.reason_code(),
                "booking rejected"
            );
            return Err(err);
        }

        self.bind(session.clone());
        debug!(session_id = %session.id, cell = %session.cell(), "session booked");
        Ok(session)
    }

    /// Remove a session and return it.
    pub fn remove(&mut self, id: &str) -> Result<Session, SchedulingError> {
        let session = self
            .unbind(id)
            .ok_or_else(|| SchedulingError::NotFound(id.to_string()))?;
        debug!(session_id = %id, cell = %session.cell(), "session removed");
        Ok(session)
    }

    /// Rebind a session to another cell.
    ///
    /// Remove then insert; when the insert half fails the original binding
    /// is restored and the error returned. Moving to the current cell is a
    /// no-op that always succeeds.
    pub fn move_session(
        &mut self,
        id: &str,
        new_date: NaiveDate,
        new_time_slot: TimeSlot,
    ) -> Result<Session, SchedulingError> {
        let target = Cell::new(new_date, new_time_slot);
        let original = self
            .sessions
            .get(id)
            .cloned()
            .ok_or_else(|| SchedulingError::NotFound(id.to_string()))?;
        if original.cell() == target {
            return Ok(original);
        }

        self.unbind(id);
        match self.insert(original.rebound(target)) {
            Ok(moved) => {
                debug!(session_id = %id, from = %original.cell(), to = %target, "session moved");
                Ok(moved)
            }
            Err(err) => {
                self.bind(original);
                Err(err)
            }
        }
    }

    fn bind(&mut self, session: Session) {
        self.cells
            .entry(session.cell())
            .or_default()
            .push(session.id.clone());
        self.sessions.insert(session.id.clone(), session);
    }

    fn unbind(&mut self, id: &str) -> Option<Session> {
        let session = self.sessions.remove(id)?;
        let cell = session.cell();
        if let Some(ids) = self.cells.get_mut(&cell) {
            ids.retain(|other| other != id);
            if ids.is_empty() {
                self.cells.remove(&cell);
            }
        }
        Some(session)
    }
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self::new(SlotTable::default(), MAX_CAPACITY)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;

    use crate::session::{NewSession, Session};
    use crate::slot::TimeSlot;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn slot(label: &str) -> TimeSlot {
        label.parse().unwrap()
    }

    pub fn session(professional: &str, day: NaiveDate, at: &str) -> Session {
        NewSession::new(format!("patient-of-{professional}"), professional, day, slot(at), 30)
            .into_session()
    }
}
