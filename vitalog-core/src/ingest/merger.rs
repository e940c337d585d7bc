//! Sleep timeline merger
//!
//! Sleep stages arrive incrementally: the watch exports overlapping batches
//! over the course of a night, re-sending segments it has already sent as it
//! refines them. This module folds a new batch into the current sleep
//! session so the store holds a single coherent timeline per night.

use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::SleepSegment;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Event type under which sleep sessions are stored.
pub const SLEEP_EVENT_TYPE: &str = "sleep_analysis";

/// A session whose last update is older than this is stale: new segments
/// start a fresh session instead of merging in. Approximates "one session
/// per night"; irregular schedules (naps) fall wherever the cutoff puts
/// them.
pub const SESSION_MERGE_WINDOW_HOURS: i64 = 16;

/// Result of a merge attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Segments were folded into an existing session
    Merged {
        /// ID of the session event that was updated
        session_id: String,
        /// Number of segments taken from the new batch
        merged: usize,
        /// Segment count of the session after the merge
        total: usize,
    },
    /// No session was updated within the merge window; the caller owns
    /// creation (plain insert), so creation and merge stay separate
    /// policies
    NoTarget,
}

/// Fold a batch of sleep segments into the most recent session.
///
/// The merge key is each segment's raw `start` string: existing segments are
/// loaded into a keyed map in their stored order, then the new batch is
/// applied in array order, inserting or overwriting under the same key.
/// Last write wins, both across batches and within the new batch. The final
/// list is sorted ascending by parsed start time, and the session event's
/// payload is replaced wholesale with its timestamp bumped to `now`.
///
/// Returns [`MergeOutcome::NoTarget`] when no session has been updated
/// within the last [`SESSION_MERGE_WINDOW_HOURS`] hours.
///
/// Fails with [`Error::InvalidInput`] on an empty batch; callers filter
/// empty data arrays before reaching this point.
///
/// Note the lookup and the update are two separate store operations with no
/// transaction around them: two writers can both observe the same target
/// (or its absence) and the later write wins. Single-instance deployments
/// tolerate this; it matches the observed upstream behavior.
pub fn merge_sleep_batch(
    db: &Database,
    new_segments: &[SleepSegment],
    now: DateTime<Utc>,
) -> Result<MergeOutcome> {
    if new_segments.is_empty() {
        return Err(Error::InvalidInput(
            "sleep segment batch is empty".to_string(),
        ));
    }

    let Some(session) = db.latest_event(SLEEP_EVENT_TYPE)? else {
        return Ok(MergeOutcome::NoTarget);
    };

    if now.signed_duration_since(session.created_at)
        >= Duration::hours(SESSION_MERGE_WINDOW_HOURS)
    {
        tracing::debug!(
            session_id = %session.id,
            last_update = %session.created_at,
            "Latest sleep session is stale, not merging"
        );
        return Ok(MergeOutcome::NoTarget);
    }

    let existing = session_segments(&session.data);

    let mut by_start: HashMap<String, SleepSegment> = HashMap::new();
    for segment in existing {
        by_start.insert(segment.start.clone(), segment);
    }
    for segment in new_segments {
        by_start.insert(segment.start.clone(), segment.clone());
    }

    let mut merged: Vec<SleepSegment> = by_start.into_values().collect();
    SleepSegment::sort_by_start(&mut merged);

    // Replace the whole segment array; sibling payload fields (units, ...)
    // are preserved
    let mut data = session.data.clone();
    let segments_json: Vec<Value> = merged.iter().map(SleepSegment::to_json).collect();
    match data.as_object_mut() {
        Some(obj) => {
            obj.insert("data".to_string(), Value::Array(segments_json));
        }
        None => data = json!({ "data": segments_json }),
    }

    db.update_event_data(&session.id, &data, now)?;

    tracing::info!(
        session_id = %session.id,
        merged = new_segments.len(),
        total = merged.len(),
        "Merged sleep segments into session"
    );

    Ok(MergeOutcome::Merged {
        session_id: session.id,
        merged: new_segments.len(),
        total: merged.len(),
    })
}

/// Extract the normalized segment list from a session event payload.
///
/// Items that fail to normalize (no start key) are dropped with a warning;
/// a malformed item must not take the rest of the session with it.
pub fn session_segments(data: &Value) -> Vec<SleepSegment> {
    let Some(items) = data.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut segments = Vec::with_capacity(items.len());
    for item in items {
        match SleepSegment::from_json(item) {
            Some(segment) => segments.push(segment),
            None => {
                tracing::warn!(item = %item, "Skipping sleep segment without a start field");
            }
        }
    }
    segments
}
