//! # vitalog-core
//!
//! Core library for vitalog - a personal life telemetry aggregator.
//!
//! This library provides:
//! - Domain types for events, sleep sessions and metric samples
//! - A SQLite-backed event store
//! - Health export ingestion with sleep-session reconciliation
//! - Derived sleep analytics (window, windowed vitals, quality)
//! - Background poller scaffolding
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Feeds:** webhook payloads and poller readings (external)
//! - **Canonical:** normalized Events in SQLite, one row per record
//! - **Derived:** windows, averages and quality labels, recomputed on read
//!
//! ## Example
//!
//! ```rust,no_run
//! use vitalog_core::{Config, Database};
//!
//! # fn main() -> vitalog_core::Result<()> {
//! let config = Config::load()?;
//! let _log_guard = vitalog_core::logging::init(&config.logging)?;
//!
//! let db = Database::open(&Config::database_path())?;
//! db.migrate()?;
//!
//! let overview = vitalog_core::analytics::sleep_overview(&db, chrono::Utc::now())?;
//! println!("last night: {}", overview.quality.display_name());
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::{Database, EventFilter};
pub use error::{Error, Result};
pub use ingest::{IngestReport, Ingestor};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod math;
pub mod pollers;
pub mod types;
