use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use clinic_scheduler_core::{Config, TimeSlot};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "clinic-scheduler", version, about = "Clinic scheduler CLI")]
struct Cli {
    /// Evaluate against this instant instead of the local clock
    /// (e.g. "2024-06-10T08:00:00")
    #[arg(long, global = true)]
    now: Option<NaiveDateTime>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the clinic's time slots
    Slots,
    /// Book a single session
    Book(commands::booking::BookArgs),
    /// Book a recurring series
    Recur(commands::booking::RecurArgs),
    /// Reschedule a session
    Move {
        /// Session ID
        id: String,
        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// New time slot (HH:MM)
        #[arg(long)]
        time: TimeSlot,
    },
    /// Cancel a session
    Remove {
        /// Session ID
        id: String,
    },
    /// Check whether a cell can take a booking
    Check {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        time: TimeSlot,
        /// Check as this professional instead of across all of them
        #[arg(long)]
        professional: Option<String>,
    },
    /// Availability for the week containing a date
    Week {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        professional: Option<String>,
    },
    /// Per-day summary for a month
    Month {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        #[arg(long)]
        professional: Option<String>,
    },
    /// List booked sessions
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        professional: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let now = cli.now.unwrap_or_else(|| Local::now().naive_local());
    let result = match cli.command {
        Commands::Slots => commands::calendar::slots(),
        Commands::Book(args) => commands::booking::book(args, now),
        Commands::Recur(args) => commands::booking::recur(args, now),
        Commands::Move { id, date, time } => commands::booking::reschedule(&id, date, time, now),
        Commands::Remove { id } => commands::booking::remove(&id, now),
        Commands::Check {
            date,
            time,
            professional,
        } => commands::calendar::check(date, time, professional, now),
        Commands::Week { date, professional } => commands::calendar::week(date, professional, now),
        Commands::Month {
            year,
            month,
            professional,
        } => commands::calendar::month(year, month, professional, now),
        Commands::List { date, professional } => commands::calendar::list(date, professional, now),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        match e.reason_code() {
            Some(code) => eprintln!("error: {code}: {e}"),
            None => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}

/// RUST_LOG wins; otherwise the configured `log_filter`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Config::load_or_default().log_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
