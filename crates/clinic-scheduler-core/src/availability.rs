//! Availability resolver.
//!
//! Pure decision functions over a grid snapshot: given a cell and a view
//! mode, report whether a new booking would be accepted. Nothing here
//! mutates the grid, so the UI and the recurrence expander can call it as
//! often as they like.
//!
//! ## Rules
//!
//! - `All` view: bookable iff the cell holds fewer than `capacity` sessions.
//! - `Single(professional)` view: additionally, the professional must not
//!   already have a session in the cell.
//!
//! Past cells are flagged with `is_past` but stay bookable; marking past
//! sessions for evaluation is left to the caller.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{ReasonCode, SchedulingError};
use crate::grid::SlotGrid;
use crate::slot::{Cell, TimeSlot};

/// Whose bookings the grid is showing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "mode", content = "professional_id", rename_all = "snake_case")]
pub enum ViewMode {
    /// Every professional; only capacity matters.
    #[default]
    All,
    /// One professional booking for themselves.
    Single(String),
}

impl ViewMode {
    pub fn professional(&self) -> Option<&str> {
        match self {
            ViewMode::All => None,
            ViewMode::Single(id) => Some(id.as_str()),
        }
    }
}

/// Result of resolving one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub is_bookable: bool,
    pub is_past: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
    /// Sessions currently in the cell.
    pub occupancy: usize,
    pub capacity: usize,
}

impl AvailabilityReport {
    pub fn cell(&self) -> Cell {
        Cell::new(self.date, self.time_slot)
    }

    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.occupancy)
    }
}

/// Decide whether `(date, time_slot)` can take a new booking under `view`.
pub fn resolve(
    grid: &SlotGrid,
    date: NaiveDate,
    time_slot: TimeSlot,
    view: &ViewMode,
    now: NaiveDateTime,
) -> AvailabilityReport {
    resolve_excluding(grid, Cell::new(date, time_slot), view, now, None)
}

/// Typed verdict behind every report: the error a booking would hit.
pub fn check(
    grid: &SlotGrid,
    cell: Cell,
    view: &ViewMode,
    exclude: Option<&str>,
) -> Result<(), SchedulingError> {
    grid.check_cell(cell, view.professional(), exclude)
}

/// Same as [`resolve`], but `exclude`'s own occupancy does not count.
///
/// Used when checking a session against the cell it already occupies.
pub fn resolve_excluding(
    grid: &SlotGrid,
    cell: Cell,
    view: &ViewMode,
    now: NaiveDateTime,
    exclude: Option<&str>,
) -> AvailabilityReport {
    let verdict = check(grid, cell, view, exclude);
    AvailabilityReport {
        date: cell.date,
        time_slot: cell.time_slot,
        is_bookable: verdict.is_ok(),
        is_past: cell.is_past(now),
        reason: verdict.err().map(|err| err.reason_code()),
        occupancy: grid.occupancy_of(cell.date, cell.time_slot),
        capacity: grid.capacity(),
    }
}

/// Every slot of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOverview {
    pub date: NaiveDate,
    pub slots: Vec<AvailabilityReport>,
}

impl DayOverview {
    pub fn bookable_count(&self) -> usize {
        self.slots.iter().filter(|r| r.is_bookable).count()
    }

    pub fn full_count(&self) -> usize {
        self.slots.iter().filter(|r| r.remaining() == 0).count()
    }

    pub fn booked_sessions(&self) -> usize {
        self.slots.iter().map(|r| r.occupancy).sum()
    }
}

pub fn day_overview(
    grid: &SlotGrid,
    date: NaiveDate,
    view: &ViewMode,
    now: NaiveDateTime,
) -> DayOverview {
    DayOverview {
        date,
        slots: grid
            .slots()
            .iter()
            .map(|slot| resolve(grid, date, slot, view, now))
            .collect(),
    }
}

/// Monday to Sunday of the week containing `date`.
pub fn week_overview(
    grid: &SlotGrid,
    date: NaiveDate,
    view: &ViewMode,
    now: NaiveDateTime,
) -> Vec<DayOverview> {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    monday
        .iter_days()
        .take(7)
        .map(|day| day_overview(grid, day, view, now))
        .collect()
}

/// Per-day counts for a month view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDaySummary {
    pub date: NaiveDate,
    pub bookable_cells: usize,
    pub full_cells: usize,
    pub booked_sessions: usize,
    pub is_past: bool,
}

/// One summary per day of `year`-`month`. Empty for an invalid month.
pub fn month_overview(
    grid: &SlotGrid,
    year: i32,
    month: u32,
    view: &ViewMode,
    now: NaiveDateTime,
) -> Vec<MonthDaySummary> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };

    first
        .iter_days()
        .take_while(|day| day.month() == month)
        .map(|day| {
            let overview = day_overview(grid, day, view, now);
            MonthDaySummary {
                date: day,
                bookable_cells: overview.bookable_count(),
                full_cells: overview.full_count(),
                booked_sessions: overview.booked_sessions(),
                // the whole day is over once its last slot has started
                is_past: overview.slots.last().is_some_and(|r| r.is_past),
            }
        })
        .collect()
}
