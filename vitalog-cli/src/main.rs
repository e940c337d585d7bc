//! vitalog - life telemetry from the command line
//!
//! Ingest health export payloads and read the derived dashboard views.

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vitalog_core::analytics::{sleep_history, sleep_overview, SleepOverview};
use vitalog_core::{Config, Database, HealthExportPayload, Ingestor};

#[derive(Parser, Debug)]
#[command(name = "vitalog")]
#[command(about = "Personal life telemetry aggregator")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest a health export payload from a JSON file
    Ingest {
        /// Path to the payload file (webhook body shape)
        file: PathBuf,
    },
    /// Show the sleep overview for the last 24 hours
    Overview {
        /// Emit JSON instead of the terminal view
        #[arg(long)]
        json: bool,
    },
    /// Show the nightly sleep history
    History {
        /// Number of days to include
        #[arg(long, default_value_t = 14)]
        days: i64,

        /// Emit JSON instead of the terminal view
        #[arg(long)]
        json: bool,
    },
    /// Show the most recent events across all sources
    Stream {
        /// Number of events to show
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = vitalog_core::logging::init(&config.logging).ok();

    let db_path = Config::database_path();
    let db = Database::open(&db_path).context("failed to open event store")?;
    db.migrate().context("failed to run migrations")?;

    match args.command {
        Command::Ingest { file } => ingest(&db, &file),
        Command::Overview { json } => overview(&db, json),
        Command::History { days, json } => history(&db, days, json),
        Command::Stream { limit } => stream(&db, limit),
    }
}

fn ingest(db: &Database, file: &PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let payload: HealthExportPayload =
        serde_json::from_str(&content).context("payload is not a health export body")?;

    let report = Ingestor::new(db).ingest_payload(&payload)?;
    println!(
        "Ingested {} metric(s): {} row(s) inserted, {} segment(s) merged, {} item(s) skipped",
        payload.data.metrics.len(),
        report.rows_inserted,
        report.segments_merged,
        report.skipped_items
    );
    Ok(())
}

fn overview(db: &Database, json: bool) -> Result<()> {
    let overview = sleep_overview(db, Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(());
    }

    print_overview(&overview);
    Ok(())
}

fn print_overview(overview: &SleepOverview) {
    println!();
    println!("SLEEP ({})", overview.quality.display_name());

    match &overview.window {
        Some(window) => {
            println!(
                "   Window:  {} - {}",
                window.start.with_timezone(&Local).format("%H:%M"),
                window.end.with_timezone(&Local).format("%H:%M")
            );
        }
        None => println!("   Window:  no sleep recorded in the last 24h"),
    }

    let stages = &overview.stages;
    println!(
        "   Total:   {:.2} hrs  (deep {:.2} / rem {:.2} / core {:.2} / awake {:.2})",
        stages.sleep_total(),
        stages.deep,
        stages.rem,
        stages.core,
        stages.awake
    );

    let related = &overview.related;
    println!(
        "   Vitals:  HR {:.0} bpm | resp {:.1} /min | O2 {:.2} % | wrist {:.1} C",
        related.sleep_hr, related.respiratory, related.oxygen, related.wrist_temp
    );
    println!();
}

fn history(db: &Database, days: i64, json: bool) -> Result<()> {
    let nights = sleep_history(db, Utc::now(), days)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&nights)?);
        return Ok(());
    }

    if nights.is_empty() {
        println!("No sleep sessions in the last {} days.", days);
        return Ok(());
    }

    println!();
    println!(
        "{:<12} {:>7} {:>7} {:>7} {:>7}",
        "DATE", "TOTAL", "DEEP", "REM", "CORE"
    );
    for night in &nights {
        println!(
            "{:<12} {:>7.2} {:>7.2} {:>7.2} {:>7.2}",
            night.date, night.total_hours, night.deep_hours, night.rem_hours, night.core_hours
        );
    }
    println!();
    Ok(())
}

fn stream(db: &Database, limit: usize) -> Result<()> {
    let events = db.latest_events(limit)?;

    if events.is_empty() {
        println!("No events in the store.");
        return Ok(());
    }

    for event in &events {
        println!(
            "{}  {:<20} {}",
            event.created_at.with_timezone(&Local).format("%m-%d %H:%M:%S"),
            event.source,
            event.event_type
        );
    }
    Ok(())
}
