//! Windowed metric matcher
//!
//! Filters vital-sign samples against the resolved sleep window and
//! averages what remains. Total over its input: no window or no matching
//! samples yields `0.0`, which dashboards render as-is.

use crate::math;
use crate::types::{HeartRateSample, MetricSample, SleepWindow};
use chrono::Duration;

/// How far the search window is widened backward in relaxed mode. Some
/// sensors (wrist temperature) begin sampling before sleep onset is
/// detected, so their readings land just ahead of the window.
pub const RELAXED_WINDOW_OFFSET_HOURS: i64 = 6;

/// Average the samples of a metric type that fall inside the sleep window.
///
/// `fallback` is matched with OR semantics: both types are accepted
/// unconditionally, with no preference between them when both exist.
/// `relaxed` widens the window backward only, never forward. The window
/// bounds are inclusive on both ends. Rounding is the caller's concern.
pub fn average_in_window(
    samples: &[MetricSample],
    primary: &str,
    fallback: Option<&str>,
    window: Option<&SleepWindow>,
    relaxed: bool,
) -> f64 {
    let Some(window) = window else {
        return 0.0;
    };

    let search_start = if relaxed {
        window.start - Duration::hours(RELAXED_WINDOW_OFFSET_HOURS)
    } else {
        window.start
    };

    let values: Vec<f64> = samples
        .iter()
        .filter(|s| s.metric_type == primary || Some(s.metric_type.as_str()) == fallback)
        .filter(|s| s.timestamp >= search_start && s.timestamp <= window.end)
        .map(|s| s.value)
        .collect();

    math::mean(&values)
}

/// Heart-rate readings that fall strictly inside the sleep window.
pub fn heart_rate_in_window(
    samples: &[HeartRateSample],
    window: Option<&SleepWindow>,
) -> Vec<f64> {
    let Some(window) = window else {
        return Vec::new();
    };

    samples
        .iter()
        .filter(|s| s.timestamp >= window.start && s.timestamp <= window.end)
        .map(|s| s.bpm)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn sample(metric_type: &str, value: f64, timestamp: DateTime<Utc>) -> MetricSample {
        MetricSample {
            metric_type: metric_type.to_string(),
            value,
            unit: None,
            timestamp,
        }
    }

    fn window() -> SleepWindow {
        // 23:00 to 07:00
        SleepWindow {
            start: Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 2, 7, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_no_window_returns_zero() {
        let samples = vec![sample("temp", 36.5, window().start)];
        assert_eq!(average_in_window(&samples, "temp", None, None, false), 0.0);
    }

    #[test]
    fn test_no_matching_samples_returns_zero() {
        let w = window();
        let samples = vec![sample("respiratory_rate", 14.0, w.start)];
        assert_eq!(
            average_in_window(&samples, "blood_oxygen", None, Some(&w), false),
            0.0
        );
    }

    #[test]
    fn test_relaxed_window_reaches_back_six_hours() {
        let w = window();
        let early = w.start - Duration::hours(5);
        let samples = vec![sample("temp", 36.0, early)];

        assert_eq!(average_in_window(&samples, "temp", None, Some(&w), true), 36.0);
        assert_eq!(average_in_window(&samples, "temp", None, Some(&w), false), 0.0);

        // Relaxation never widens forward
        let late = w.end + Duration::hours(1);
        let samples = vec![sample("temp", 36.0, late)];
        assert_eq!(average_in_window(&samples, "temp", None, Some(&w), true), 0.0);
    }

    #[test]
    fn test_fallback_type_has_or_semantics() {
        let w = window();
        let samples = vec![
            sample("blood_oxygen_saturation", 97.0, w.start),
            sample("blood_oxygen", 95.0, w.start + Duration::hours(1)),
        ];
        // Both types contribute; no preference between them
        assert_eq!(
            average_in_window(
                &samples,
                "blood_oxygen_saturation",
                Some("blood_oxygen"),
                Some(&w),
                false
            ),
            96.0
        );
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let w = window();
        let samples = vec![sample("temp", 36.0, w.start), sample("temp", 37.0, w.end)];
        assert_eq!(
            average_in_window(&samples, "temp", None, Some(&w), false),
            36.5
        );
    }

    #[test]
    fn test_heart_rate_strict_window() {
        let w = window();
        let samples = vec![
            HeartRateSample {
                bpm: 55.0,
                timestamp: w.start + Duration::hours(2),
            },
            HeartRateSample {
                bpm: 80.0,
                timestamp: w.start - Duration::hours(1),
            },
        ];
        assert_eq!(heart_rate_in_window(&samples, Some(&w)), vec![55.0]);
        assert!(heart_rate_in_window(&samples, None).is_empty());
    }
}
