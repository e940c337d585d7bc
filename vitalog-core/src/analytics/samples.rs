//! Flattened read views over stored health events
//!
//! Ingestion stores one event per metric name with the whole sample array
//! nested inside. The read side flattens those payloads back out into
//! individual samples so the matcher can filter them by timestamp.

use crate::db::{Database, EventFilter};
use crate::error::Result;
use crate::ingest::SLEEP_EVENT_TYPE;
use crate::types::{parse_timestamp, HeartRateSample, MetricSample, SleepSegment};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Flatten stored events of the given types into individual metric samples.
///
/// Only samples whose own timestamp is at or after `since` are kept; the
/// event's insert time is just a coarse pre-filter. Items without a
/// parseable `date` or a numeric `qty` are skipped.
pub fn metric_samples(
    db: &Database,
    types: &[&str],
    since: DateTime<Utc>,
) -> Result<Vec<MetricSample>> {
    let events = db.list_events(&EventFilter {
        event_types: Some(types.iter().map(|t| t.to_string()).collect()),
        since: Some(since),
        ..Default::default()
    })?;

    let mut samples = Vec::new();
    for event in &events {
        let unit = event.data.get("units").and_then(Value::as_str);
        for item in payload_items(&event.data) {
            let Some(timestamp) = item_timestamp(item) else {
                tracing::debug!(event_id = %event.id, "Skipping sample without a date");
                continue;
            };
            let Some(value) = item.get("qty").and_then(Value::as_f64) else {
                tracing::debug!(event_id = %event.id, "Skipping sample without a qty");
                continue;
            };
            if timestamp < since {
                continue;
            }
            samples.push(MetricSample {
                metric_type: event.event_type.clone(),
                value,
                unit: unit.map(str::to_string),
                timestamp,
            });
        }
    }
    Ok(samples)
}

/// Flatten stored `heart_rate` events into bpm readings.
///
/// Health export heart-rate items carry Min/Avg/Max; `Avg` is the bpm
/// reading, with `qty` as a fallback for single-value exports.
pub fn heart_rate_samples(db: &Database, since: DateTime<Utc>) -> Result<Vec<HeartRateSample>> {
    let events = db.list_events(&EventFilter {
        event_type: Some("heart_rate".to_string()),
        since: Some(since),
        ..Default::default()
    })?;

    let mut samples = Vec::new();
    for event in &events {
        for item in payload_items(&event.data) {
            let Some(timestamp) = item_timestamp(item) else {
                continue;
            };
            let Some(bpm) = item
                .get("Avg")
                .or_else(|| item.get("qty"))
                .and_then(Value::as_f64)
            else {
                continue;
            };
            if timestamp < since {
                continue;
            }
            samples.push(HeartRateSample { bpm, timestamp });
        }
    }
    Ok(samples)
}

/// The sleep segment timeline covering sessions updated since `since`.
///
/// Segments are kept only when their own parsed start is at or after
/// `since`, then sorted ascending - one timeline across sessions, the way
/// the dashboard renders it.
pub fn sleep_segments_since(db: &Database, since: DateTime<Utc>) -> Result<Vec<SleepSegment>> {
    let events = db.list_events(&EventFilter {
        event_type: Some(SLEEP_EVENT_TYPE.to_string()),
        since: Some(since),
        ascending: true,
        ..Default::default()
    })?;

    let mut segments = Vec::new();
    for event in &events {
        for item in payload_items(&event.data) {
            let Some(segment) = SleepSegment::from_json(item) else {
                tracing::warn!(event_id = %event.id, "Skipping sleep segment without a start field");
                continue;
            };
            match segment.parse_start() {
                Some(start) if start >= since => segments.push(segment),
                _ => {}
            }
        }
    }
    SleepSegment::sort_by_start(&mut segments);
    Ok(segments)
}

/// The nested `data` array of a stored metric event.
fn payload_items(data: &Value) -> &[Value] {
    match data.get("data").and_then(Value::as_array) {
        Some(items) => items,
        None => &[],
    }
}

fn item_timestamp(item: &Value) -> Option<DateTime<Utc>> {
    item.get("date")
        .or_else(|| item.get("timestamp"))
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
}
