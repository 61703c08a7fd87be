//! Scheduler facade over the shared grid.
//!
//! Ties the grid, the availability resolver, the recurrence expander and
//! the reschedule coordinator together behind one handle configured from
//! [`BookingConfig`]:
//! - Validates single bookings and books them in one locked step
//! - Expands and submits recurring series occurrence by occurrence
//! - Reschedules with the same checks as a fresh booking
//! - Reports every commit as an [`Event`]
//!
//! "Now" is always passed in by the caller.

use chrono::{NaiveDate, NaiveDateTime};

use crate::availability::{self, AvailabilityReport, DayOverview, MonthDaySummary, ViewMode};
use crate::error::SchedulingError;
use crate::events::Event;
use crate::grid::{SharedGrid, SlotGrid, MAX_CAPACITY};
use crate::recurrence::{
    self, BookingResult, RecurrenceExpander, RecurrencePattern, SeriesSeed, DEFAULT_HARD_CAP,
};
use crate::reschedule::{self, RescheduleOutcome, RescheduleRequest};
use crate::session::{NewSession, Session};
use crate::slot::{SlotTable, TimeSlot};

/// Booking limits applied by the scheduler.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Sessions per cell
    pub capacity: usize,
    /// Occurrences generated for an unbounded recurrence
    pub recurrence_hard_cap: usize,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_CAPACITY,
            recurrence_hard_cap: DEFAULT_HARD_CAP,
        }
    }
}

/// Clinic scheduler
#[derive(Debug, Clone)]
pub struct Scheduler {
    grid: SharedGrid,
    expander: RecurrenceExpander,
}

impl Scheduler {
    /// Create a scheduler over an empty grid
    pub fn new(slots: SlotTable, config: &BookingConfig) -> Self {
        Self::with_grid(SlotGrid::new(slots, config.capacity), config)
    }

    /// Create a scheduler over an existing grid
    pub fn with_grid(grid: SlotGrid, config: &BookingConfig) -> Self {
        Self {
            grid: SharedGrid::new(grid),
            expander: RecurrenceExpander::new(config.recurrence_hard_cap),
        }
    }

    pub fn grid(&self) -> &SharedGrid {
        &self.grid
    }

    /// Availability of one cell.
    pub fn check(
        &self,
        date: NaiveDate,
        time_slot: TimeSlot,
        view: &ViewMode,
        now: NaiveDateTime,
    ) -> AvailabilityReport {
        self.grid
            .read(|grid| availability::resolve(grid, date, time_slot, view, now))
    }

    /// Book a single session.
    ///
    /// # Returns
    /// The committed session and a `SessionBooked` event.
    pub fn book(
        &self,
        request: NewSession,
        now: NaiveDateTime,
    ) -> Result<(Session, Event), SchedulingError> {
        let session = self.grid.insert(request.into_session())?;
        let cell = session.cell();
        let event = Event::SessionBooked {
            session_id: session.id.clone(),
            professional_id: session.professional_id.clone(),
            cell,
            is_past: cell.is_past(now),
            at: now,
        };
        Ok((session, event))
    }

    /// Expand a recurring series and book what fits.
    ///
    /// # Errors
    /// `InvalidRecurrence` before anything is booked. Per-occurrence
    /// conflicts are reported in [`BookingResult::skipped`] instead.
    pub fn book_series(
        &self,
        seed: &SeriesSeed,
        pattern: &RecurrencePattern,
        now: NaiveDateTime,
    ) -> Result<(BookingResult, Event), SchedulingError> {
        let candidates = self.expander.expand(seed, pattern)?;
        let recurrence_id = candidates.first().and_then(|c| c.recurrence_id.clone());

        let result = recurrence::submit_with(candidates, |candidate| self.grid.insert(candidate));
        let event = Event::SeriesSubmitted {
            recurrence_id,
            committed: result.committed.len(),
            skipped: result.skipped.len(),
            at: now,
        };
        Ok((result, event))
    }

    pub fn reschedule(
        &self,
        request: &RescheduleRequest,
        now: NaiveDateTime,
    ) -> Result<(RescheduleOutcome, Event), SchedulingError> {
        let outcome = reschedule::reschedule_shared(&self.grid, request, now)?;
        let event = Event::SessionRescheduled {
            session_id: outcome.session.id.clone(),
            from: outcome.from,
            to: outcome.session.cell(),
            is_past: outcome.is_past,
            at: now,
        };
        Ok((outcome, event))
    }

    pub fn remove(
        &self,
        session_id: &str,
        now: NaiveDateTime,
    ) -> Result<(Session, Event), SchedulingError> {
        let session = self.grid.remove(session_id)?;
        let event = Event::SessionRemoved {
            session_id: session.id.clone(),
            cell: session.cell(),
            at: now,
        };
        Ok((session, event))
    }

    pub fn day_overview(&self, date: NaiveDate, view: &ViewMode, now: NaiveDateTime) -> DayOverview {
        self.grid
            .read(|grid| availability::day_overview(grid, date, view, now))
    }

    pub fn week_overview(
        &self,
        date: NaiveDate,
        view: &ViewMode,
        now: NaiveDateTime,
    ) -> Vec<DayOverview> {
        self.grid
            .read(|grid| availability::week_overview(grid, date, view, now))
    }

    pub fn month_overview(
        &self,
        year: i32,
        month: u32,
        view: &ViewMode,
        now: NaiveDateTime,
    ) -> Vec<MonthDaySummary> {
        self.grid
            .read(|grid| availability::month_overview(grid, year, month, view, now))
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SlotTable::default(), &BookingConfig::default())
    }
}
