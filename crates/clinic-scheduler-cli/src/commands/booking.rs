use chrono::{NaiveDate, NaiveDateTime};
use clap::Args;
use clinic_scheduler_core::error::{Result, ValidationError};
use clinic_scheduler_core::{
    Frequency, NewSession, RecurrencePattern, RescheduleRequest, SeriesSeed, SessionType, TimeSlot,
};
use tracing::debug;

use super::{print_json, Context};

#[derive(Args)]
pub struct BookArgs {
    /// Patient ID
    #[arg(long)]
    patient: String,
    /// Professional ID
    #[arg(long)]
    professional: String,
    /// Date (YYYY-MM-DD)
    #[arg(long)]
    date: NaiveDate,
    /// Time slot (HH:MM)
    #[arg(long)]
    time: TimeSlot,
    /// Duration in minutes (defaults to booking.default_duration_minutes)
    #[arg(long)]
    duration: Option<u32>,
    /// therapy, evaluation or reevaluation
    #[arg(long, default_value = "therapy")]
    session_type: String,
}

impl BookArgs {
    fn session_type(&self) -> Result<SessionType, ValidationError> {
        SessionType::parse(&self.session_type).ok_or_else(|| ValidationError::InvalidValue {
            field: "session_type".to_string(),
            message: format!("unknown session type '{}'", self.session_type),
        })
    }
}

#[derive(Args)]
pub struct RecurArgs {
    #[command(flatten)]
    booking: BookArgs,
    /// daily, weekly or monthly
    #[arg(long)]
    frequency: String,
    /// Repeat every N periods
    #[arg(long, default_value_t = 1)]
    interval: u32,
    /// Number of occurrences
    #[arg(long)]
    count: Option<u32>,
    /// Stop before this date (YYYY-MM-DD)
    #[arg(long)]
    until: Option<NaiveDate>,
}

pub fn book(args: BookArgs, now: NaiveDateTime) -> Result<()> {
    let ctx = Context::open(now)?;
    let session_type = args.session_type()?;
    let duration = args
        .duration
        .unwrap_or(ctx.config.booking.default_duration_minutes);

    let request = NewSession::new(
        args.patient,
        args.professional,
        args.date,
        args.time,
        duration,
    )
    .with_type(session_type);

    let (session, event) = ctx.scheduler.book(request, ctx.now)?;
    ctx.store.upsert(&session)?;
    debug!(?event, "session booked");
    print_json(&session)
}

pub fn recur(args: RecurArgs, now: NaiveDateTime) -> Result<()> {
    let mut ctx = Context::open(now)?;
    let frequency =
        Frequency::parse(&args.frequency).ok_or_else(|| ValidationError::InvalidValue {
            field: "frequency".to_string(),
            message: format!("unknown frequency '{}'", args.frequency),
        })?;

    let mut pattern = RecurrencePattern::new(frequency, args.interval);
    if let Some(count) = args.count {
        pattern = pattern.times(count);
    }
    if let Some(until) = args.until {
        pattern = pattern.until(until);
    }

    let booking = &args.booking;
    let seed = SeriesSeed {
        patient_id: booking.patient.clone(),
        professional_id: booking.professional.clone(),
        start_date: booking.date,
        time_slot: booking.time,
        duration_minutes: booking
            .duration
            .unwrap_or(ctx.config.booking.default_duration_minutes),
        session_type: booking.session_type()?,
    };

    let (result, event) = ctx.scheduler.book_series(&seed, &pattern, ctx.now)?;
    ctx.store.upsert_all(&result.committed)?;
    debug!(?event, "series submitted");
    print_json(&result)
}

pub fn reschedule(id: &str, date: NaiveDate, time: TimeSlot, now: NaiveDateTime) -> Result<()> {
    let ctx = Context::open(now)?;
    let request = RescheduleRequest::new(id, date, time);

    let (outcome, event) = ctx.scheduler.reschedule(&request, ctx.now)?;
    if outcome.moved {
        ctx.store.upsert(&outcome.session)?;
    }
    debug!(?event, "session rescheduled");
    print_json(&outcome)
}

pub fn remove(id: &str, now: NaiveDateTime) -> Result<()> {
    let ctx = Context::open(now)?;
    let (session, event) = ctx.scheduler.remove(id, ctx.now)?;
    ctx.store.delete(&session.id)?;
    debug!(?event, "session removed");
    print_json(&session)
}
