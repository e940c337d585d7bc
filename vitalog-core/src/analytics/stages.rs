//! Per-stage duration totals over a segment timeline.

use crate::types::{SegmentKind, SleepSegment, SleepStages};

/// Sum stage durations across a timeline, in hours.
///
/// Raw segments bucket by case-insensitive substring of the phase name,
/// checked in deep/rem/core/awake order; phases matching none of the four
/// are ignored. Raw `qty` is minutes; summarized fields are hours.
pub fn stage_totals(segments: &[SleepSegment]) -> SleepStages {
    let mut totals = SleepStages::default();

    for segment in segments {
        match &segment.kind {
            SegmentKind::Summarized {
                deep,
                rem,
                core,
                awake,
            } => {
                totals.deep += deep;
                totals.rem += rem;
                totals.core += core;
                totals.awake += awake;
            }
            SegmentKind::Raw { phase, qty } => {
                let phase = phase.to_lowercase();
                let hours = qty / 60.0;
                if phase.contains("deep") {
                    totals.deep += hours;
                } else if phase.contains("rem") {
                    totals.rem += hours;
                } else if phase.contains("core") {
                    totals.core += hours;
                } else if phase.contains("awake") {
                    totals.awake += hours;
                }
            }
        }
    }

    totals
}
