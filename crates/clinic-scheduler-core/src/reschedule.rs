//! Moving booked sessions.
//!
//! A reschedule is validated exactly like a fresh booking by the session's
//! own professional: the destination is resolved in `Single(professional)`
//! view, then the grid performs an atomic move. Rescheduling onto the cell
//! the session already occupies does not count the session against itself,
//! so a no-op move always succeeds.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::availability::{self, ViewMode};
use crate::error::SchedulingError;
use crate::grid::{SharedGrid, SlotGrid};
use crate::session::Session;
use crate::slot::{Cell, TimeSlot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub session_id: String,
    pub new_date: NaiveDate,
    pub new_time_slot: TimeSlot,
}

impl RescheduleRequest {
    pub fn new(session_id: impl Into<String>, new_date: NaiveDate, new_time_slot: TimeSlot) -> Self {
        Self {
            session_id: session_id.into(),
            new_date,
            new_time_slot,
        }
    }

    pub fn target(&self) -> Cell {
        Cell::new(self.new_date, self.new_time_slot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleOutcome {
    /// The session as now bound.
    pub session: Session,
    pub from: Cell,
    /// False for a no-op reschedule onto the same cell.
    pub moved: bool,
    /// Destination is before `now`; past-session handling is the caller's.
    pub is_past: bool,
}

/// Move a session on a grid the caller owns exclusively.
///
/// # Errors
/// `NotFound`, `CapacityExceeded`, `ProfessionalDoubleBooked` or
/// `UnknownTimeSlot`. The grid is unchanged on error.
pub fn reschedule(
    grid: &mut SlotGrid,
    request: &RescheduleRequest,
    now: NaiveDateTime,
) -> Result<RescheduleOutcome, SchedulingError> {
    let session = grid
        .get(&request.session_id)
        .cloned()
        .ok_or_else(|| SchedulingError::NotFound(request.session_id.clone()))?;

    let from = session.cell();
    let target = request.target();
    let exclude = (from == target).then_some(session.id.as_str());
    let view = ViewMode::Single(session.professional_id.clone());
    availability::check(grid, target, &view, exclude)?;

    let moved = grid.move_session(&session.id, target.date, target.time_slot)?;
    Ok(RescheduleOutcome {
        session: moved,
        from,
        moved: from != target,
        is_past: target.is_past(now),
    })
}

/// Move a session on a shared grid.
///
/// Resolution and move run under one write lock, so no other booking can
/// take the destination seat in between.
pub fn reschedule_shared(
    grid: &SharedGrid,
    request: &RescheduleRequest,
    now: NaiveDateTime,
) -> Result<RescheduleOutcome, SchedulingError> {
    grid.write(|grid| reschedule(grid, request, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::test_support::*;

    fn now() -> NaiveDateTime {
        date(2024, 6, 1).and_hms_opt(8, 0, 0).unwrap()
    }

    #[test]
    fn noop_reschedule_succeeds_in_full_cell() {
        let mut grid = SlotGrid::default();
        let day = date(2024, 6, 10);
        let mine = grid.insert(session("ana", day, "09:00")).unwrap();
        grid.insert(session("bruno", day, "09:00")).unwrap();
        grid.insert(session("carla", day, "09:00")).unwrap();

        let outcome = reschedule(
            &mut grid,
            &RescheduleRequest::new(&mine.id, day, slot("09:00")),
            now(),
        )
        .unwrap();
        assert!(!outcome.moved);
        assert_eq!(outcome.session, mine);
        assert_eq!(grid.occupancy_of(day, slot("09:00")), 3);
    }

    #[test]
    fn move_into_full_cell_fails_and_leaves_session() {
        let mut grid = SlotGrid::default();
        let day = date(2024, 6, 10);
        for pro in ["ana", "bruno", "carla"] {
            grid.insert(session(pro, day, "09:00")).unwrap();
        }
        let other = grid.insert(session("diego", day, "10:00")).unwrap();

        let err = reschedule(
            &mut grid,
            &RescheduleRequest::new(&other.id, day, slot("09:00")),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, SchedulingError::CapacityExceeded { .. }));
        assert_eq!(grid.get(&other.id).unwrap().cell(), other.cell());
        assert_eq!(grid.occupancy_of(day, slot("09:00")), 3);
    }

    #[test]
    fn owner_cannot_be_moved_onto_own_booking() {
        let mut grid = SlotGrid::default();
        let day = date(2024, 6, 10);
        let first = grid.insert(session("ana", day, "09:00")).unwrap();
        grid.insert(session("ana", day, "10:00")).unwrap();

        let err = reschedule(
            &mut grid,
            &RescheduleRequest::new(&first.id, day, slot("10:00")),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, SchedulingError::ProfessionalDoubleBooked { .. }));
    }

    #[test]
    fn successful_move_reports_origin_and_past_flag() {
        let mut grid = SlotGrid::default();
        let day = date(2024, 6, 10);
        let mine = grid.insert(session("ana", day, "09:00")).unwrap();

        let earlier = date(2024, 5, 20);
        let outcome = reschedule(
            &mut grid,
            &RescheduleRequest::new(&mine.id, earlier, slot("11:00")),
            now(),
        )
        .unwrap();
        assert!(outcome.moved);
        assert!(outcome.is_past);
        assert_eq!(outcome.from, mine.cell());
        assert_eq!(outcome.session.cell(), Cell::new(earlier, slot("11:00")));
        assert_eq!(grid.occupancy_of(day, slot("09:00")), 0);
    }

    #[test]
    fn unknown_session_and_slot() {
        let mut grid = SlotGrid::default();
        let day = date(2024, 6, 10);
        let err = reschedule(
            &mut grid,
            &RescheduleRequest::new("ghost", day, slot("09:00")),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, SchedulingError::NotFound("ghost".into()));

        let mine = grid.insert(session("ana", day, "09:00")).unwrap();
        let err = reschedule(
            &mut grid,
            &RescheduleRequest::new(&mine.id, day, slot("21:00")),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, SchedulingError::UnknownTimeSlot("21:00".into()));
    }

    #[test]
    fn shared_reschedule_round_trip() {
        let grid = SharedGrid::default();
        let day = date(2024, 6, 10);
        let mine = grid.insert(session("ana", day, "09:00")).unwrap();

        reschedule_shared(&grid, &RescheduleRequest::new(&mine.id, day, slot("14:00")), now())
            .unwrap();
        assert_eq!(grid.occupancy_of(day, slot("14:00")), 1);
        reschedule_shared(&grid, &RescheduleRequest::new(&mine.id, day, slot("09:00")), now())
            .unwrap();
        assert_eq!(grid.occupancy_of(day, slot("09:00")), 1);
        assert_eq!(grid.occupancy_of(day, slot("14:00")), 0);
    }
}
