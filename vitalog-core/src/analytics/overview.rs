//! Sleep overview and history assembly
//!
//! The overview is what the dashboard's sleep card renders: stage totals,
//! the resolved window, windowed vital averages and a quality label. This
//! is the presentation boundary, so rounding happens here and nowhere
//! deeper.

use crate::analytics::{
    average_in_window, classify, heart_rate_in_window, heart_rate_samples, metric_samples,
    resolve_window, sleep_segments_since, stage_totals,
};
use crate::db::{Database, EventFilter};
use crate::error::Result;
use crate::ingest::SLEEP_EVENT_TYPE;
use crate::ingest::merger::session_segments;
use crate::math;
use crate::types::{SleepQuality, SleepSegment, SleepStages, SleepWindow};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

/// Vital metric types fetched for the overview's related-metrics row.
pub const VITAL_METRIC_TYPES: [&str; 5] = [
    "respiratory_rate",
    "blood_oxygen_saturation",
    "blood_oxygen",
    "apple_sleeping_wrist_temperature",
    "body_temperature",
];

/// Windowed vital averages shown alongside the sleep card.
///
/// Zero means "no samples in window" as much as it means zero; consumers
/// render the value either way.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RelatedMetrics {
    /// Mean bpm inside the strict window, whole number
    pub sleep_hr: f64,
    /// Breaths per minute, 1 decimal
    pub respiratory: f64,
    /// Blood oxygen saturation percent, 2 decimals
    pub oxygen: f64,
    /// Wrist temperature (relaxed window), 1 decimal
    pub wrist_temp: f64,
}

/// Everything the sleep dashboard card needs, computed from the last 24h.
#[derive(Debug, Clone, Serialize)]
pub struct SleepOverview {
    /// Stage totals in hours, 2 decimals
    pub stages: SleepStages,
    /// Resolved window, if any sleep was recorded
    pub window: Option<SleepWindow>,
    /// Windowed vital averages
    pub related: RelatedMetrics,
    /// Quality label (classified on unrounded totals)
    pub quality: SleepQuality,
    /// The merged segment timeline, ascending
    #[serde(skip)]
    pub timeline: Vec<SleepSegment>,
}

/// One night in the sleep history rollup.
#[derive(Debug, Clone, Serialize)]
pub struct SleepNight {
    /// Calendar date the session ended on
    pub date: NaiveDate,
    pub total_hours: f64,
    pub deep_hours: f64,
    pub rem_hours: f64,
    pub core_hours: f64,
}

/// Assemble the sleep overview as of `now`.
pub fn sleep_overview(db: &Database, now: DateTime<Utc>) -> Result<SleepOverview> {
    let since = now - Duration::hours(24);

    let timeline = sleep_segments_since(db, since)?;
    let stages = stage_totals(&timeline);
    let window = resolve_window(&timeline);

    let vitals = metric_samples(db, &VITAL_METRIC_TYPES, since)?;
    let heart_rates = heart_rate_samples(db, since)?;

    let related = RelatedMetrics {
        sleep_hr: math::round_to(
            math::mean(&heart_rate_in_window(&heart_rates, window.as_ref())),
            0,
        ),
        respiratory: math::round_to(
            average_in_window(&vitals, "respiratory_rate", None, window.as_ref(), false),
            1,
        ),
        oxygen: math::round_to(
            average_in_window(
                &vitals,
                "blood_oxygen_saturation",
                Some("blood_oxygen"),
                window.as_ref(),
                false,
            ),
            2,
        ),
        wrist_temp: math::round_to(
            average_in_window(
                &vitals,
                "apple_sleeping_wrist_temperature",
                Some("body_temperature"),
                window.as_ref(),
                true,
            ),
            1,
        ),
    };

    let quality = classify(&stages);

    Ok(SleepOverview {
        stages: SleepStages {
            deep: math::round_to(stages.deep, 2),
            rem: math::round_to(stages.rem, 2),
            core: math::round_to(stages.core, 2),
            awake: math::round_to(stages.awake, 2),
        },
        window,
        related,
        quality,
        timeline,
    })
}

/// Nightly rollup of the last `days` sleep sessions, newest first.
///
/// Each stored session becomes one night; sessions whose timeline yields no
/// window are skipped.
pub fn sleep_history(db: &Database, now: DateTime<Utc>, days: i64) -> Result<Vec<SleepNight>> {
    let events = db.list_events(&EventFilter {
        event_type: Some(SLEEP_EVENT_TYPE.to_string()),
        since: Some(now - Duration::days(days)),
        ..Default::default()
    })?;

    let mut nights = Vec::with_capacity(events.len());
    for event in &events {
        let segments = session_segments(&event.data);
        let Some(window) = resolve_window(&segments) else {
            continue;
        };
        let stages = stage_totals(&segments);
        nights.push(SleepNight {
            date: window.end.date_naive(),
            total_hours: math::round_to(stages.sleep_total(), 2),
            deep_hours: math::round_to(stages.deep, 2),
            rem_hours: math::round_to(stages.rem, 2),
            core_hours: math::round_to(stages.core, 2),
        });
    }
    Ok(nights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Event;
    use serde_json::json;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn seed_sleep(db: &Database, now: DateTime<Utc>, segments: serde_json::Value) {
        let event = Event::new(
            "health_auto_export",
            SLEEP_EVENT_TYPE,
            json!({ "data": segments }),
            now,
        );
        db.insert_event(&event).unwrap();
    }

    #[test]
    fn test_overview_with_no_data() {
        let db = test_db();
        let overview = sleep_overview(&db, Utc::now()).unwrap();
        assert!(overview.window.is_none());
        assert_eq!(overview.quality, SleepQuality::NoData);
        assert_eq!(overview.related.sleep_hr, 0.0);
        assert!(overview.timeline.is_empty());
    }

    #[test]
    fn test_overview_assembles_window_and_vitals() {
        let db = test_db();
        let now = Utc::now();
        let start = now - Duration::hours(9);
        let end = now - Duration::hours(1);

        seed_sleep(
            &db,
            now,
            json!([
                {
                    "startDate": start.to_rfc3339(),
                    "endDate": end.to_rfc3339(),
                    "value": "Core",
                    "qty": 480.0
                }
            ]),
        );

        let mid = (start + Duration::hours(4)).to_rfc3339();
        db.insert_event(&Event::new(
            "health_auto_export",
            "respiratory_rate",
            json!({ "units": "count/min", "data": [ { "date": mid, "qty": 14.25 } ] }),
            now,
        ))
        .unwrap();
        db.insert_event(&Event::new(
            "health_auto_export",
            "heart_rate",
            json!({ "units": "bpm", "data": [ { "date": mid, "Avg": 55.4 } ] }),
            now,
        ))
        .unwrap();

        let overview = sleep_overview(&db, now).unwrap();
        let window = overview.window.unwrap();
        assert_eq!(window.start.to_rfc3339(), start.to_rfc3339());
        assert_eq!(window.end.to_rfc3339(), end.to_rfc3339());

        assert_eq!(overview.stages.core, 8.0);
        assert_eq!(overview.related.respiratory, 14.3); // 1 decimal
        assert_eq!(overview.related.sleep_hr, 55.0); // whole number
        assert_eq!(overview.related.oxygen, 0.0); // no samples -> zero
        // 8h core, no deep/rem: efficient but not restorative
        assert_eq!(overview.quality, SleepQuality::Fair);
    }

    #[test]
    fn test_history_rolls_up_per_session() {
        let db = test_db();
        let now = Utc::now();

        // Two nights, one session each
        for nights_ago in [1i64, 2] {
            let end = now - Duration::days(nights_ago) + Duration::hours(7);
            let start = end - Duration::hours(8);
            seed_sleep(
                &db,
                now - Duration::days(nights_ago),
                json!([
                    {
                        "startDate": start.to_rfc3339(),
                        "endDate": end.to_rfc3339(),
                        "value": "Deep",
                        "qty": 90.0
                    }
                ]),
            );
        }

        let nights = sleep_history(&db, now, 14).unwrap();
        assert_eq!(nights.len(), 2);
        // Newest first
        assert!(nights[0].date > nights[1].date);
        assert_eq!(nights[0].deep_hours, 1.5);
        assert_eq!(nights[0].total_hours, 1.5);
    }
}
