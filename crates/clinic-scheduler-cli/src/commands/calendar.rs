use chrono::{NaiveDate, NaiveDateTime};
use clinic_scheduler_core::error::Result;
use clinic_scheduler_core::{Config, Session, TimeSlot};

use super::{print_json, view_mode, Context};

pub fn slots() -> Result<()> {
    let table = Config::load()?.slot_table()?;
    let labels: Vec<String> = table.iter().map(|slot| slot.to_string()).collect();
    print_json(&labels)
}

pub fn check(
    date: NaiveDate,
    time: TimeSlot,
    professional: Option<String>,
    now: NaiveDateTime,
) -> Result<()> {
    let ctx = Context::open(now)?;
    let report = ctx
        .scheduler
        .check(date, time, &view_mode(professional), ctx.now);
    print_json(&report)
}

pub fn week(date: NaiveDate, professional: Option<String>, now: NaiveDateTime) -> Result<()> {
    let ctx = Context::open(now)?;
    let days = ctx
        .scheduler
        .week_overview(date, &view_mode(professional), ctx.now);
    print_json(&days)
}

pub fn month(
    year: i32,
    month: u32,
    professional: Option<String>,
    now: NaiveDateTime,
) -> Result<()> {
    let ctx = Context::open(now)?;
    let days = ctx
        .scheduler
        .month_overview(year, month, &view_mode(professional), ctx.now);
    print_json(&days)
}

pub fn list(
    date: Option<NaiveDate>,
    professional: Option<String>,
    now: NaiveDateTime,
) -> Result<()> {
    let ctx = Context::open(now)?;
    let mut sessions: Vec<Session> = ctx.scheduler.grid().read(|grid| match date {
        Some(date) => grid.sessions_on(date).into_iter().cloned().collect(),
        None => grid.iter().cloned().collect(),
    });

    if let Some(professional) = professional {
        sessions.retain(|s| s.professional_id == professional);
    }
    sessions.sort_by(|a, b| a.cell().cmp(&b.cell()).then_with(|| a.id.cmp(&b.id)));
    print_json(&sessions)
}
