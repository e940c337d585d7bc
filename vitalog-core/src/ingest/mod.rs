//! Ingestion layer for health export payloads
//!
//! The health export webhook delivers a batch of named metrics. Each metric
//! becomes one stored Event holding the metric's entire sample array, with
//! one exception: `sleep_analysis` batches are folded into the current
//! sleep session by the [`merger`] instead of piling up as separate rows.
//!
//! ```text
//! ┌──────────────────┐     ┌──────────┐     ┌──────────────────┐
//! │ health export    │ ──► │ Ingestor │ ──► │     Database     │
//! │ webhook payload  │     │          │     │     (events)     │
//! └──────────────────┘     └──────────┘     └──────────────────┘
//!                               │
//!                               ▼ (sleep_analysis only)
//!                      ┌──────────────────┐
//!                      │ merge_sleep_batch│
//!                      └──────────────────┘
//! ```

pub mod merger;

pub use merger::{
    merge_sleep_batch, MergeOutcome, SESSION_MERGE_WINDOW_HOURS, SLEEP_EVENT_TYPE,
};

use crate::db::Database;
use crate::error::Result;
use crate::types::{Event, HealthExportPayload, NamedMetric, SleepSegment};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// Source identifier for events written by this ingest path.
pub const HEALTH_EXPORT_SOURCE: &str = "health_auto_export";

/// Result of ingesting one payload.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// New event rows inserted
    pub rows_inserted: usize,
    /// Sleep segments folded into an existing session
    pub segments_merged: usize,
    /// Payload items dropped for violating the input contract
    pub skipped_items: usize,
}

/// Fans a health export batch out to the store.
pub struct Ingestor<'a> {
    db: &'a Database,
}

impl<'a> Ingestor<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Ingest a full webhook payload.
    pub fn ingest_payload(&self, payload: &HealthExportPayload) -> Result<IngestReport> {
        self.ingest(&payload.data.metrics)
    }

    /// Ingest a batch of named metrics.
    pub fn ingest(&self, metrics: &[NamedMetric]) -> Result<IngestReport> {
        self.ingest_at(metrics, Utc::now())
    }

    /// Ingest a batch of named metrics at an explicit time.
    ///
    /// An empty batch is a no-op success. A malformed item inside a batch is
    /// logged and skipped rather than failing the whole batch; store errors
    /// propagate untouched.
    pub fn ingest_at(&self, metrics: &[NamedMetric], now: DateTime<Utc>) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        for metric in metrics {
            if metric.name == SLEEP_EVENT_TYPE && !metric.data.is_empty() {
                self.ingest_sleep(metric, now, &mut report)?;
            } else {
                self.insert_metric(metric, now)?;
                report.rows_inserted += 1;
            }
        }

        tracing::info!(
            metrics = metrics.len(),
            rows_inserted = report.rows_inserted,
            segments_merged = report.segments_merged,
            "Ingested health export batch"
        );

        Ok(report)
    }

    /// Sleep path: merge into the open session, or start a new one.
    fn ingest_sleep(
        &self,
        metric: &NamedMetric,
        now: DateTime<Utc>,
        report: &mut IngestReport,
    ) -> Result<()> {
        let mut segments = Vec::with_capacity(metric.data.len());
        for item in &metric.data {
            match SleepSegment::from_json(item) {
                Some(segment) => segments.push(segment),
                None => {
                    tracing::warn!(item = %item, "Skipping sleep item without a start field");
                    report.skipped_items += 1;
                }
            }
        }

        if segments.is_empty() {
            // Nothing keyable survived; keep the raw payload as a plain row
            self.insert_metric(metric, now)?;
            report.rows_inserted += 1;
            return Ok(());
        }

        match merge_sleep_batch(self.db, &segments, now)? {
            MergeOutcome::Merged { merged, .. } => {
                report.segments_merged += merged;
            }
            MergeOutcome::NoTarget => {
                // No open session: this batch becomes a brand-new session
                SleepSegment::sort_by_start(&mut segments);
                let data = sleep_session_data(metric, &segments);
                let event = Event::new(HEALTH_EXPORT_SOURCE, SLEEP_EVENT_TYPE, data, now);
                self.db.insert_event(&event)?;
                report.rows_inserted += 1;
            }
        }
        Ok(())
    }

    /// Default path: the entire sample array nested in a single event.
    fn insert_metric(&self, metric: &NamedMetric, now: DateTime<Utc>) -> Result<()> {
        let data = json!({
            "units": metric.units,
            "data": metric.data,
        });
        let event = Event::new(HEALTH_EXPORT_SOURCE, metric.name.clone(), data, now);
        self.db.insert_event(&event)
    }
}

fn sleep_session_data(metric: &NamedMetric, segments: &[SleepSegment]) -> Value {
    json!({
        "units": metric.units,
        "data": segments.iter().map(SleepSegment::to_json).collect::<Vec<_>>(),
    })
}
