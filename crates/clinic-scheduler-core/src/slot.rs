//! Discrete time axis shared by every clinic day.
//!
//! A [`TimeSlot`] is one bookable time-of-day mark (e.g. `09:30`). The
//! [`SlotTable`] is the ordered, finite enumeration of those marks derived
//! from the clinic's opening hours; it is identical for every date. A
//! [`Cell`] pairs a date with a slot and is the unit of capacity.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{SchedulingError, ValidationError};

/// A time-of-day label, minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot(NaiveTime);

impl TimeSlot {
    /// 00:00, the lowest possible slot.
    pub const MIDNIGHT: TimeSlot = TimeSlot(NaiveTime::MIN);

    /// Build a slot from hour and minute. Returns `None` when out of range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(TimeSlot)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    /// Minutes since midnight.
    pub fn minute_of_day(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for TimeSlot {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(TimeSlot)
            .map_err(|_| SchedulingError::UnknownTimeSlot(s.to_string()))
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = SchedulingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.to_string()
    }
}

/// A (date, time slot) pair. Sessions occupy cells; capacity is per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
}

impl Cell {
    pub fn new(date: NaiveDate, time_slot: TimeSlot) -> Self {
        Self { date, time_slot }
    }

    /// Wall-clock start of this cell.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time_slot.time())
    }

    /// Strictly before `now`.
    pub fn is_past(&self, now: NaiveDateTime) -> bool {
        self.starts_at() < now
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time_slot)
    }
}

/// Ordered enumeration of the clinic's bookable slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotTable {
    slots: Vec<TimeSlot>,
    slot_minutes: u32,
}

impl SlotTable {
    /// Build the table `[opening, closing)` in steps of `slot_minutes`.
    ///
    /// # Errors
    /// Returns an error if the window is empty, the step is outside
    /// `1..=1440`, or the step does not evenly divide the window.
    pub fn new(
        opening: TimeSlot,
        closing: TimeSlot,
        slot_minutes: u32,
    ) -> Result<Self, ValidationError> {
        if slot_minutes == 0 || slot_minutes > 24 * 60 {
            return Err(ValidationError::InvalidValue {
                field: "slot_minutes".into(),
                message: format!("must be within 1..=1440, got {slot_minutes}"),
            });
        }
        if opening >= closing {
            return Err(ValidationError::InvalidValue {
                field: "closing_time".into(),
                message: format!("closing time {closing} must be after opening time {opening}"),
            });
        }

        let span = closing.minute_of_day() - opening.minute_of_day();
        if span % slot_minutes != 0 {
            return Err(ValidationError::InvalidValue {
                field: "slot_minutes".into(),
                message: format!("{slot_minutes} does not divide the {span}-minute opening window"),
            });
        }

        let step = Duration::minutes(slot_minutes as i64);
        let slots = (0..span / slot_minutes)
            .map(|i| TimeSlot(opening.time() + step * i as i32))
            .collect();

        Ok(Self {
            slots,
            slot_minutes,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        self.slots.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot_minutes(&self) -> u32 {
        self.slot_minutes
    }

    pub fn first(&self) -> Option<TimeSlot> {
        self.slots.first().copied()
    }

    pub fn contains(&self, slot: TimeSlot) -> bool {
        self.index_of(slot).is_some()
    }

    pub fn index_of(&self, slot: TimeSlot) -> Option<usize> {
        self.slots.binary_search(&slot).ok()
    }

    /// Parse a label and check it belongs to this table.
    pub fn parse(&self, label: &str) -> Result<TimeSlot, SchedulingError> {
        let slot: TimeSlot = label.parse()?;
        self.ensure(slot)
    }

    /// Reject slots that are not part of the table.
    pub fn ensure(&self, slot: TimeSlot) -> Result<TimeSlot, SchedulingError> {
        if self.contains(slot) {
            Ok(slot)
        } else {
            Err(SchedulingError::UnknownTimeSlot(slot.to_string()))
        }
    }
}

impl Default for SlotTable {
    /// 08:00 to 20:00 in 30-minute marks.
    fn default() -> Self {
        let slots = (16..40)
            .map(|half_hours: u32| TimeSlot(clock(half_hours / 2, (half_hours % 2) * 30)))
            .collect();
        Self {
            slots,
            slot_minutes: 30,
        }
    }
}

fn clock(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(s: &str) -> TimeSlot {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_displays_hh_mm() {
        assert_eq!(slot("09:30").to_string(), "09:30");
        assert_eq!(slot(" 9:00 ").to_string(), "09:00");
        assert!("9h00".parse::<TimeSlot>().is_err());
        assert!("25:00".parse::<TimeSlot>().is_err());
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&slot("14:00")).unwrap();
        assert_eq!(json, "\"14:00\"");
        let back: TimeSlot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, slot("14:00"));
        assert!(serde_json::from_str::<TimeSlot>("\"noon\"").is_err());
    }

    #[test]
    fn table_is_ordered_and_half_open() {
        let table = SlotTable::new(slot("08:00"), slot("10:00"), 30).unwrap();
        let labels: Vec<String> = table.iter().map(|s| s.to_string()).collect();
        assert_eq!(labels, vec!["08:00", "08:30", "09:00", "09:30"]);
        assert!(!table.contains(slot("10:00")));
        assert_eq!(table.index_of(slot("09:00")), Some(2));
    }

    #[test]
    fn default_table_matches_configured_default() {
        let table = SlotTable::default();
        let built = SlotTable::new(slot("08:00"), slot("20:00"), 30).unwrap();
        assert_eq!(table, built);
        assert_eq!(table.len(), 24);
        assert_eq!(table.first(), Some(slot("08:00")));
    }

    #[test]
    fn rejects_bad_tables() {
        assert!(SlotTable::new(slot("10:00"), slot("08:00"), 30).is_err());
        assert!(SlotTable::new(slot("08:00"), slot("08:00"), 30).is_err());
        assert!(SlotTable::new(slot("08:00"), slot("09:00"), 0).is_err());
        assert!(SlotTable::new(slot("08:00"), slot("09:00"), 25).is_err());
    }

    #[test]
    fn parse_checks_membership() {
        let table = SlotTable::default();
        assert!(table.parse("09:00").is_ok());
        assert_eq!(
            table.parse("09:15"),
            Err(SchedulingError::UnknownTimeSlot("09:15".into()))
        );
        assert!(table.parse("07:30").is_err());
    }

    #[test]
    fn cell_past_is_strict() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let cell = Cell::new(date, slot("09:00"));
        let at_start = date.and_hms_opt(9, 0, 0).unwrap();
        assert!(!cell.is_past(at_start));
        assert!(cell.is_past(at_start + Duration::seconds(1)));
        assert_eq!(cell.to_string(), "2024-06-10 09:00");
    }
}
