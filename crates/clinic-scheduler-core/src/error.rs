//! Core error types for clinic-scheduler-core.
//!
//! Business rejections (full cell, double booking, bad recurrence, unknown
//! session) live in [`SchedulingError`] and are always recoverable. The
//! remaining enums cover the collaborator adapters (SQLite store, TOML config).

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::slot::TimeSlot;

/// Core error type for clinic-scheduler-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Booking, recurrence and reschedule rejections
    #[error("Scheduling error: {0}")]
    Scheduling(#[from] SchedulingError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Reason code when this is a business rejection.
    pub fn reason_code(&self) -> Option<ReasonCode> {
        match self {
            CoreError::Scheduling(err) => Some(err.reason_code()),
            _ => None,
        }
    }
}

/// Rejections raised by the scheduling engine.
///
/// None of these leave the grid partially mutated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    /// The cell already holds `capacity` sessions
    #[error("Slot {date} {time_slot} is fully booked ({capacity} sessions)")]
    CapacityExceeded {
        date: NaiveDate,
        time_slot: TimeSlot,
        capacity: usize,
    },

    /// The professional already has a session in the cell
    #[error("Professional '{professional_id}' is already booked at {date} {time_slot}")]
    ProfessionalDoubleBooked {
        professional_id: String,
        date: NaiveDate,
        time_slot: TimeSlot,
    },

    /// Recurrence request rejected before expansion
    #[error("Invalid recurrence: {0}")]
    InvalidRecurrence(String),

    /// Unknown session id
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Time label outside the clinic's slot table
    #[error("Unknown time slot: {0}")]
    UnknownTimeSlot(String),

    /// A session with this id is already on the grid
    #[error("Session already booked: {0}")]
    DuplicateSession(String),
}

impl SchedulingError {
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            SchedulingError::CapacityExceeded { .. } => ReasonCode::CapacityExceeded,
            SchedulingError::ProfessionalDoubleBooked { .. } => {
                ReasonCode::ProfessionalDoubleBooked
            }
            SchedulingError::InvalidRecurrence(_) => ReasonCode::InvalidRecurrence,
            SchedulingError::NotFound(_) => ReasonCode::NotFound,
            SchedulingError::UnknownTimeSlot(_) => ReasonCode::UnknownTimeSlot,
            SchedulingError::DuplicateSession(_) => ReasonCode::DuplicateSession,
        }
    }
}

/// Stable, serialisable code for a rejection.
///
/// Callers map these to localized messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    CapacityExceeded,
    ProfessionalDoubleBooked,
    InvalidRecurrence,
    NotFound,
    UnknownTimeSlot,
    DuplicateSession,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::CapacityExceeded => "capacity_exceeded",
            ReasonCode::ProfessionalDoubleBooked => "professional_double_booked",
            ReasonCode::InvalidRecurrence => "invalid_recurrence",
            ReasonCode::NotFound => "not_found",
            ReasonCode::UnknownTimeSlot => "unknown_time_slot",
            ReasonCode::DuplicateSession => "duplicate_session",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored row could not be decoded
    #[error("Corrupt row for session '{id}': {message}")]
    CorruptRow { id: String, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
