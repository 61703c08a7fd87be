//! SQLite-based session storage.
//!
//! The scheduling core keeps its grid in memory; this store lets the CLI
//! keep sessions between invocations. Loading goes back through the grid's
//! normal insert checks, so a tampered file can never produce an
//! over-capacity cell.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::session::{Session, SessionType};
use crate::slot::TimeSlot;

/// SQLite database for booked sessions.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open the database at `<data_dir>/sessions.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("sessions.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id               TEXT PRIMARY KEY,
                patient_id       TEXT NOT NULL,
                professional_id  TEXT NOT NULL,
                date             TEXT NOT NULL,
                time_slot        TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL,
                session_type     TEXT NOT NULL DEFAULT 'therapy',
                recurrence_id    TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_cell ON sessions(date, time_slot);
            CREATE INDEX IF NOT EXISTS idx_sessions_professional ON sessions(professional_id);",
        )?;
        Ok(())
    }

    /// Insert or update one session.
    pub fn upsert(&self, session: &Session) -> Result<()> {
        upsert_row(&self.conn, session)
    }

    /// Upsert a batch in one transaction.
    pub fn upsert_all<'a>(&mut self, sessions: impl IntoIterator<Item = &'a Session>) -> Result<()> {
        let tx = self.conn.transaction()?;
        for session in sessions {
            upsert_row(&tx, session)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Every stored session, ordered by cell.
    pub fn load_all(&self) -> Result<Vec<Session>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, patient_id, professional_id, date, time_slot, duration_minutes, session_type, recurrence_id
             FROM sessions
             ORDER BY date, time_slot, rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RawSession {
                id: row.get(0)?,
                patient_id: row.get(1)?,
                professional_id: row.get(2)?,
                date: row.get(3)?,
                time_slot: row.get(4)?,
                duration_minutes: row.get(5)?,
                session_type: row.get(6)?,
                recurrence_id: row.get(7)?,
            })
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?.decode()?);
        }
        Ok(sessions)
    }
}

fn upsert_row(conn: &Connection, session: &Session) -> Result<()> {
    conn.execute(
        "INSERT INTO sessions
            (id, patient_id, professional_id, date, time_slot, duration_minutes, session_type, recurrence_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
            patient_id = excluded.patient_id,
            professional_id = excluded.professional_id,
            date = excluded.date,
            time_slot = excluded.time_slot,
            duration_minutes = excluded.duration_minutes,
            session_type = excluded.session_type,
            recurrence_id = excluded.recurrence_id",
        params![
            session.id,
            session.patient_id,
            session.professional_id,
            session.date.format("%Y-%m-%d").to_string(),
            session.time_slot.to_string(),
            session.duration_minutes,
            session.session_type.as_str(),
            session.recurrence_id,
        ],
    )?;
    Ok(())
}

/// Row as stored, before decoding.
struct RawSession {
    id: String,
    patient_id: String,
    professional_id: String,
    date: String,
    time_slot: String,
    duration_minutes: u32,
    session_type: String,
    recurrence_id: Option<String>,
}

impl RawSession {
    fn decode(self) -> Result<Session, DatabaseError> {
        let corrupt = |message: String| DatabaseError::CorruptRow {
            id: self.id.clone(),
            message,
        };
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|e| corrupt(format!("date '{}': {e}", self.date)))?;
        let time_slot: TimeSlot = self
            .time_slot
            .parse()
            .map_err(|e| corrupt(format!("{e}")))?;
        let session_type = SessionType::parse(&self.session_type)
            .ok_or_else(|| corrupt(format!("session type '{}'", self.session_type)))?;

        Ok(Session {
            is_recurring: self.recurrence_id.is_some(),
            id: self.id,
            patient_id: self.patient_id,
            professional_id: self.professional_id,
            date,
            time_slot,
            duration_minutes: self.duration_minutes,
            session_type,
            recurrence_id: self.recurrence_id,
        })
    }
}
