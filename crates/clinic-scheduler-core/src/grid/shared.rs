//! Single-writer handle over a [`SlotGrid`].
//!
//! Mutations hold the write lock for their whole check-then-act, so two
//! bookings racing for the last seat of a cell are serialized. Reads hold
//! the read lock and never observe a half-applied move.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;

use super::SlotGrid;
use crate::error::SchedulingError;
use crate::session::Session;
use crate::slot::TimeSlot;

/// Cloneable, thread-safe grid handle.
#[derive(Debug, Clone, Default)]
pub struct SharedGrid {
    inner: Arc<RwLock<SlotGrid>>,
}

impl SharedGrid {
    pub fn new(grid: SlotGrid) -> Self {
        Self {
            inner: Arc::new(RwLock::new(grid)),
        }
    }

    // Every mutation is all-or-nothing, so a poisoned lock still guards a
    // consistent grid.
    fn read_guard(&self) -> RwLockReadGuard<'_, SlotGrid> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, SlotGrid> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a read-only closure against a consistent snapshot.
    pub fn read<R>(&self, f: impl FnOnce(&SlotGrid) -> R) -> R {
        f(&self.read_guard())
    }

    /// Run a closure with exclusive access.
    pub fn write<R>(&self, f: impl FnOnce(&mut SlotGrid) -> R) -> R {
        f(&mut self.write_guard())
    }

    /// Owned copy of the current grid.
    pub fn snapshot(&self) -> SlotGrid {
        self.read_guard().clone()
    }

    pub fn occupancy_of(&self, date: NaiveDate, time_slot: TimeSlot) -> usize {
        self.read_guard().occupancy_of(date, time_slot)
    }

    pub fn occupancy_of_professional(
        &self,
        date: NaiveDate,
        time_slot: TimeSlot,
        professional_id: &str,
    ) -> usize {
        self.read_guard()
            .occupancy_of_professional(date, time_slot, professional_id)
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        self.read_guard().get(id).cloned()
    }

    pub fn insert(&self, session: Session) -> Result<Session, SchedulingError> {
        self.write_guard().insert(session)
    }

    pub fn remove(&self, id: &str) -> Result<Session, SchedulingError> {
        self.write_guard().remove(id)
    }

    pub fn move_session(
        &self,
        id: &str,
        new_date: NaiveDate,
        new_time_slot: TimeSlot,
    ) -> Result<Session, SchedulingError> {
        self.write_guard().move_session(id, new_date, new_time_slot)
    }
}
