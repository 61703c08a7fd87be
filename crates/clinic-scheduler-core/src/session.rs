//! Booked therapy sessions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slot::{Cell, TimeSlot};

/// Kind of appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    #[default]
    Therapy,
    Evaluation,
    Reevaluation,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Therapy => "therapy",
            SessionType::Evaluation => "evaluation",
            SessionType::Reevaluation => "reevaluation",
        }
    }

    /// Parse from the lowercase label; unknown labels are rejected.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "therapy" => Some(SessionType::Therapy),
            "evaluation" => Some(SessionType::Evaluation),
            "reevaluation" => Some(SessionType::Reevaluation),
            _ => None,
        }
    }
}

/// A session bound to exactly one cell.
///
/// Patient and professional ids are opaque; display data is resolved
/// elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub patient_id: String,
    pub professional_id: String,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub duration_minutes: u32,
    pub session_type: SessionType,
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_id: Option<String>,
}

impl Session {
    pub fn cell(&self) -> Cell {
        Cell::new(self.date, self.time_slot)
    }

    /// Same session bound to a different cell.
    pub(crate) fn rebound(&self, cell: Cell) -> Self {
        Self {
            date: cell.date,
            time_slot: cell.time_slot,
            ..self.clone()
        }
    }
}

/// A booking request before it receives an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub patient_id: String,
    pub professional_id: String,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub duration_minutes: u32,
    #[serde(default)]
    pub session_type: SessionType,
}

impl NewSession {
    pub fn new(
        patient_id: impl Into<String>,
        professional_id: impl Into<String>,
        date: NaiveDate,
        time_slot: TimeSlot,
        duration_minutes: u32,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            professional_id: professional_id.into(),
            date,
            time_slot,
            duration_minutes,
            session_type: SessionType::default(),
        }
    }

    pub fn with_type(mut self, session_type: SessionType) -> Self {
        self.session_type = session_type;
        self
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.date, self.time_slot)
    }

    /// Assign a fresh id. The result is a candidate until inserted.
    pub fn into_session(self) -> Session {
        Session {
            id: Uuid::new_v4().to_string(),
            patient_id: self.patient_id,
            professional_id: self.professional_id,
            date: self.date,
            time_slot: self.time_slot,
            duration_minutes: self.duration_minutes,
            session_type: self.session_type,
            is_recurring: false,
            recurrence_id: None,
        }
    }
}
