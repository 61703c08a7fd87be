//! Recurring session expansion.
//!
//! A [`RecurrencePattern`] turns one seed booking into a bounded,
//! chronological list of candidate sessions. Expansion commits nothing;
//! [`submit`] then books each candidate on its own. A candidate that hits a
//! full cell or a double booking is skipped and reported, the rest of the
//! series still goes in.
//!
//! ## Bounds
//!
//! At most one of `end_date` (exclusive) and `occurrence_count` may be set.
//! With neither, the series stops at the expander's hard cap (default
//! [`DEFAULT_HARD_CAP`]). An `end_date` series is also capped.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{ReasonCode, SchedulingError};
use crate::grid::SlotGrid;
use crate::session::{Session, SessionType};
use crate::slot::TimeSlot;

/// Occurrences generated when no end condition is given.
pub const DEFAULT_HARD_CAP: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            _ => None,
        }
    }
}

/// How a seed booking repeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    pub interval: u32,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub occurrence_count: Option<u32>,
}

impl RecurrencePattern {
    pub fn new(frequency: Frequency, interval: u32) -> Self {
        Self {
            frequency,
            interval,
            end_date: None,
            occurrence_count: None,
        }
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn times(mut self, occurrence_count: u32) -> Self {
        self.occurrence_count = Some(occurrence_count);
        self
    }

    /// Reject patterns that cannot be expanded from `start`.
    pub fn validate(&self, start: NaiveDate) -> Result<(), SchedulingError> {
        if self.interval < 1 {
            return Err(SchedulingError::InvalidRecurrence(
                "interval must be at least 1".into(),
            ));
        }
        if self.end_date.is_some() && self.occurrence_count.is_some() {
            return Err(SchedulingError::InvalidRecurrence(
                "end date and occurrence count are mutually exclusive".into(),
            ));
        }
        if self.occurrence_count == Some(0) {
            return Err(SchedulingError::InvalidRecurrence(
                "occurrence count must be at least 1".into(),
            ));
        }
        if let Some(end) = self.end_date {
            if end <= start {
                return Err(SchedulingError::InvalidRecurrence(format!(
                    "end date {end} must be after start date {start}"
                )));
            }
        }
        Ok(())
    }

    /// Date of the `n`-th occurrence (0 = `start`).
    ///
    /// Computed from the anchor rather than stepwise, so monthly series
    /// starting on the 31st do not drift after a short month.
    fn nth(&self, start: NaiveDate, n: u32) -> Option<NaiveDate> {
        let steps = self.interval.checked_mul(n)?;
        match self.frequency {
            Frequency::Daily => start.checked_add_days(Days::new(steps as u64)),
            Frequency::Weekly => start.checked_add_days(Days::new(steps as u64 * 7)),
            Frequency::Monthly => start.checked_add_months(Months::new(steps)),
        }
    }
}

/// The booking every occurrence copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesSeed {
    pub patient_id: String,
    pub professional_id: String,
    pub start_date: NaiveDate,
    pub time_slot: TimeSlot,
    pub duration_minutes: u32,
    #[serde(default)]
    pub session_type: SessionType,
}

/// Expands patterns under a fixed hard cap.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceExpander {
    hard_cap: usize,
}

impl RecurrenceExpander {
    /// A cap of zero is raised to one.
    pub fn new(hard_cap: usize) -> Self {
        Self {
            hard_cap: hard_cap.max(1),
        }
    }

    pub fn hard_cap(&self) -> usize {
        self.hard_cap
    }

    /// Produce the ordered candidate sessions for `seed`.
    ///
    /// All candidates share a fresh recurrence id. Nothing is booked.
    ///
    /// # Errors
    /// `InvalidRecurrence` before any candidate is generated.
    pub fn expand(
        &self,
        seed: &SeriesSeed,
        pattern: &RecurrencePattern,
    ) -> Result<Vec<Session>, SchedulingError> {
        pattern.validate(seed.start_date)?;

        let limit = pattern
            .occurrence_count
            .map_or(self.hard_cap, |count| count as usize);
        let recurrence_id = Uuid::new_v4().to_string();

        let mut candidates = Vec::new();
        let mut count: u32 = 0;
        while (count as usize) < limit {
            let Some(date) = pattern.nth(seed.start_date, count) else {
                break;
            };
            if pattern.end_date.is_some_and(|end| date >= end) {
                break;
            }
            candidates.push(Session {
                id: Uuid::new_v4().to_string(),
                patient_id: seed.patient_id.clone(),
                professional_id: seed.professional_id.clone(),
                date,
                time_slot: seed.time_slot,
                duration_minutes: seed.duration_minutes,
                session_type: seed.session_type,
                is_recurring: true,
                recurrence_id: Some(recurrence_id.clone()),
            });
            count += 1;
        }
        Ok(candidates)
    }
}

impl Default for RecurrenceExpander {
    fn default() -> Self {
        Self::new(DEFAULT_HARD_CAP)
    }
}

/// An occurrence that could not be booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedOccurrence {
    pub candidate: Session,
    pub reason: ReasonCode,
}

/// Outcome of submitting a series: partial success is normal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BookingResult {
    pub committed: Vec<Session>,
    pub skipped: Vec<SkippedOccurrence>,
}

impl BookingResult {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn total(&self) -> usize {
        self.committed.len() + self.skipped.len()
    }
}

/// Book each candidate into `grid`, skipping the ones that conflict.
pub fn submit(grid: &mut SlotGrid, candidates: Vec<Session>) -> BookingResult {
    submit_with(candidates, |candidate| grid.insert(candidate))
}

/// Book each candidate through `insert`, one independent transaction each.
///
/// Candidates are attempted in order and never retried.
pub fn submit_with<F>(candidates: Vec<Session>, mut insert: F) -> BookingResult
where
    F: FnMut(Session) -> Result<Session, SchedulingError>,
{
    let mut result = BookingResult::default();
    for candidate in candidates {
        match insert(candidate.clone()) {
            Ok(session) => result.committed.push(session),
            Err(err) => result.skipped.push(SkippedOccurrence {
                candidate,
                reason: err.reason_code(),
            }),
        }
    }

    info!(
        committed = result.committed.len(),
        skipped = result.skipped.len(),
        "recurring series submitted"
    );
    result
}
