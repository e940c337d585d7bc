//! Sleep window resolver
//!
//! Derives the `[start, end]` interval of the most recent sleep session
//! from its merged segment timeline.

use crate::types::{SleepSegment, SleepWindow};

/// Resolve the sleep window from a segment timeline.
///
/// The window spans the earliest to the latest recorded point across
/// *both* the start and end timestamps of every segment: a single segment
/// with `start=T1, end=T2` contributes both `T1` and `T2` to the min/max.
/// Timestamps that fail to parse are skipped; returns `None` for an empty
/// timeline or one with no parseable timestamps.
pub fn resolve_window(segments: &[SleepSegment]) -> Option<SleepWindow> {
    let timestamps: Vec<_> = segments
        .iter()
        .flat_map(|s| [s.parse_start(), s.parse_end()])
        .flatten()
        .collect();

    let start = *timestamps.iter().min()?;
    let end = *timestamps.iter().max()?;
    Some(SleepWindow { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SegmentKind;
    use chrono::{TimeZone, Utc};

    fn segment(start: &str, end: Option<&str>) -> SleepSegment {
        SleepSegment {
            start: start.to_string(),
            end: end.map(str::to_string),
            kind: SegmentKind::Raw {
                phase: "Core".to_string(),
                qty: 30.0,
            },
        }
    }

    #[test]
    fn test_empty_timeline_has_no_window() {
        assert!(resolve_window(&[]).is_none());
    }

    #[test]
    fn test_single_segment_contributes_both_endpoints() {
        let window =
            resolve_window(&[segment("2024-01-01T23:00:00Z", Some("2024-01-02T00:00:00Z"))])
                .unwrap();
        assert_eq!(
            window.start,
            Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap()
        );
        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_window_start_never_exceeds_end() {
        let window = resolve_window(&[
            segment("2024-01-02T03:00:00Z", Some("2024-01-02T03:30:00Z")),
            segment("2024-01-01T23:00:00Z", Some("2024-01-02T00:00:00Z")),
        ])
        .unwrap();
        assert!(window.start <= window.end);
    }

    #[test]
    fn test_adding_a_segment_only_widens() {
        let base = vec![segment("2024-01-02T01:00:00Z", Some("2024-01-02T02:00:00Z"))];
        let before = resolve_window(&base).unwrap();

        let mut wider = base.clone();
        wider.push(segment("2024-01-02T04:00:00Z", Some("2024-01-02T04:30:00Z")));
        let after = resolve_window(&wider).unwrap();

        assert!(after.start <= before.start);
        assert!(after.end >= before.end);
    }

    #[test]
    fn test_unparseable_timestamps_are_skipped() {
        let window = resolve_window(&[
            segment("garbage", None),
            segment("2024-01-01T23:00:00Z", Some("also garbage")),
        ])
        .unwrap();
        assert_eq!(window.start, window.end);

        assert!(resolve_window(&[segment("garbage", None)]).is_none());
    }
}
