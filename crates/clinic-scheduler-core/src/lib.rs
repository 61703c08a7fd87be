//! # Clinic Scheduler Core Library
//!
//! This library provides the slot-capacity scheduling engine for a
//! therapy clinic. Every calendar cell (a date and a fixed time slot) holds
//! at most three sessions, and a professional holds at most one of them.
//! The CLI binary is a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Grid**: In-memory map of cells to booked sessions, the only place
//!   placement rules are enforced
//! - **Availability**: Read-only resolver answering "can this cell take a
//!   booking?" per view mode, plus day/week/month overviews
//! - **Recurrence**: Expands a series into candidate sessions and submits
//!   them one by one, collecting the occurrences that did not fit
//! - **Reschedule**: Validates and performs atomic moves
//! - **Click**: Single/double-click disambiguation on a cell
//! - **Storage**: SQLite-based session storage and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Scheduler`]: Facade over a shared grid emitting [`Event`]s
//! - [`SlotGrid`]: Capacity-enforcing booking grid
//! - [`RecurrenceExpander`]: Recurring series expansion
//! - [`ClickDisambiguator`]: Create/inspect intent state machine
//! - [`SessionStore`]: Session persistence
//! - [`Config`]: Application configuration management

pub mod availability;
pub mod click;
pub mod error;
pub mod events;
pub mod grid;
pub mod recurrence;
pub mod reschedule;
pub mod scheduler;
pub mod session;
pub mod slot;
pub mod storage;

pub use availability::{AvailabilityReport, DayOverview, MonthDaySummary, ViewMode};
pub use click::{ClickDisambiguator, ClickIntent, ClickState};
pub use error::{
    ConfigError, CoreError, DatabaseError, ReasonCode, SchedulingError, ValidationError,
};
pub use events::Event;
pub use grid::{SharedGrid, SlotGrid, MAX_CAPACITY};
pub use recurrence::{
    BookingResult, Frequency, RecurrenceExpander, RecurrencePattern, SeriesSeed, SkippedOccurrence,
};
pub use reschedule::{RescheduleOutcome, RescheduleRequest};
pub use scheduler::{BookingConfig, Scheduler};
pub use session::{NewSession, Session, SessionType};
pub use slot::{Cell, SlotTable, TimeSlot};
pub use storage::{Config, SessionStore};
