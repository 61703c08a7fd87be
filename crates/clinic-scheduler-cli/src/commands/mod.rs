pub mod booking;
pub mod calendar;
pub mod config;

use chrono::NaiveDateTime;
use clinic_scheduler_core::error::Result;
use clinic_scheduler_core::{Config, Scheduler, SessionStore, SlotGrid, ViewMode};
use serde::Serialize;
use tracing::warn;

/// Loaded configuration, store and a scheduler rebuilt from the store.
pub struct Context {
    pub config: Config,
    pub store: SessionStore,
    pub scheduler: Scheduler,
    pub now: NaiveDateTime,
}

impl Context {
    pub fn open(now: NaiveDateTime) -> Result<Self> {
        let config = Config::load()?;
        let store = SessionStore::open()?;

        let (grid, rejected) = SlotGrid::from_sessions(
            config.slot_table()?,
            config.booking.capacity,
            store.load_all()?,
        );
        for (session, err) in &rejected {
            warn!(
                session_id = %session.id,
                reason = %err.reason_code(),
                "stored session does not fit the current grid"
            );
        }

        let scheduler = Scheduler::with_grid(grid, &config.booking_config());
        Ok(Self {
            config,
            store,
            scheduler,
            now,
        })
    }
}

pub fn view_mode(professional: Option<String>) -> ViewMode {
    professional.map_or(ViewMode::All, ViewMode::Single)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
