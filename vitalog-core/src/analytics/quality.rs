//! Sleep quality classifier
//!
//! Derives a categorical quality label from per-stage durations.

use crate::types::{SleepQuality, SleepStages};

/// Classify a night's sleep from its stage totals.
///
/// `sleep_total` counts deep + rem + core only; awake time inside the
/// window contributes to the efficiency denominator but never to the
/// numerator. Efficiency gates the restorative-percent thresholds:
///
/// | efficiency | restorative % | label |
/// |-----------|---------------|-----------|
/// | < 0.85    | >= 35         | Fair      |
/// | < 0.85    | < 35          | Poor      |
/// | >= 0.85   | >= 40         | Excellent |
/// | >= 0.85   | 25..40        | Good      |
/// | >= 0.85   | < 25          | Fair      |
pub fn classify(stages: &SleepStages) -> SleepQuality {
    let sleep_total = stages.sleep_total();
    if sleep_total == 0.0 {
        return SleepQuality::NoData;
    }

    let total_duration = sleep_total + stages.awake;
    let efficiency = if total_duration > 0.0 {
        sleep_total / total_duration
    } else {
        0.0
    };
    let restorative_percent = (stages.deep + stages.rem) / sleep_total * 100.0;

    if efficiency < 0.85 {
        if restorative_percent >= 35.0 {
            SleepQuality::Fair
        } else {
            SleepQuality::Poor
        }
    } else if restorative_percent >= 40.0 {
        SleepQuality::Excellent
    } else if restorative_percent >= 25.0 {
        SleepQuality::Good
    } else {
        SleepQuality::Fair
    }
}
