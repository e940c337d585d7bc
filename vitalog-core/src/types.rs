//! Core domain types for vitalog
//!
//! These types represent the canonical data model that normalizes telemetry
//! from all supported feeds (health export webhooks, music/gaming pollers,
//! GPS pushes).
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Event** | One timestamped, typed record in the store; the unit everything else is derived from |
//! | **Source** | The integration an Event came from (`health_auto_export`, `spotify`, `steam`, ...) |
//! | **Sleep session** | One `sleep_analysis` Event whose payload holds a night's segment timeline |
//! | **Sleep segment** | One stage interval (deep/rem/core/awake) within a session |
//! | **Metric sample** | A single vital-sign reading flattened out of a stored Event |
//! | **Sleep window** | Derived `[start, end]` interval of the most recent session; never persisted |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cmp::Ordering;

// ============================================
// Events
// ============================================

/// A generic telemetry event.
///
/// Events are created by ingestion and pollers, and are immutable after
/// insert with one exception: the sleep merge rewrites the payload of the
/// current sleep session and bumps `created_at`. Retention is external;
/// the core never deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Origin integration (`health_auto_export`, `spotify`, `steam`,
    /// `traccar_<device>`, `github_<user>`)
    pub source: String,
    /// Payload shape discriminator (`sleep_analysis`, `track_played`,
    /// `location`, `code_push`, or a health metric name)
    pub event_type: String,
    /// Insert time; bumped to "now" on each sleep merge
    pub created_at: DateTime<Utc>,
    /// Arbitrary JSON payload; shape determined by `event_type`
    pub data: Value,
}

impl Event {
    /// Create a new event with a fresh UUID.
    pub fn new(
        source: impl Into<String>,
        event_type: impl Into<String>,
        data: Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source: source.into(),
            event_type: event_type.into(),
            created_at,
            data,
        }
    }
}

// ============================================
// Sleep segments
// ============================================

/// Stage payload of a sleep segment.
///
/// Health export delivers sleep in two shapes: a summarized form with
/// per-stage hour totals, and a raw form with a phase name and a duration.
/// The source's duck-typed field probing becomes an explicit variant here.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    /// Per-stage totals, in hours
    Summarized {
        deep: f64,
        rem: f64,
        core: f64,
        awake: f64,
    },
    /// A single phase interval; `qty` is the duration in minutes
    Raw { phase: String, qty: f64 },
}

/// One stage interval of a sleep session.
///
/// `start` is kept as the raw string from the payload: it is the segment's
/// identity key for merge deduplication and is compared byte-for-byte,
/// never parsed or normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct SleepSegment {
    /// Raw start timestamp string (dedup key)
    pub start: String,
    /// Raw end timestamp string, if present
    pub end: Option<String>,
    /// Stage payload
    pub kind: SegmentKind,
}

impl SleepSegment {
    /// Normalize a raw payload object into a segment.
    ///
    /// Accepts `date` or `startDate` for the start key and `endDate` for the
    /// end. Presence of any of `rem`/`core`/`deep` selects the summarized
    /// shape; otherwise `value` + `qty` select the raw shape. Returns `None`
    /// for objects with no start field (input contract violation; callers
    /// log and skip) or with neither shape's fields.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let start = obj
            .get("date")
            .or_else(|| obj.get("startDate"))
            .and_then(Value::as_str)?
            .to_string();
        let end = obj
            .get("endDate")
            .and_then(Value::as_str)
            .map(str::to_string);

        let has_summary = ["rem", "core", "deep"].iter().any(|k| obj.contains_key(*k));
        let kind = if has_summary {
            SegmentKind::Summarized {
                deep: obj.get("deep").and_then(Value::as_f64).unwrap_or(0.0),
                rem: obj.get("rem").and_then(Value::as_f64).unwrap_or(0.0),
                core: obj.get("core").and_then(Value::as_f64).unwrap_or(0.0),
                awake: obj.get("awake").and_then(Value::as_f64).unwrap_or(0.0),
            }
        } else {
            SegmentKind::Raw {
                phase: obj.get("value").and_then(Value::as_str)?.to_string(),
                qty: obj.get("qty").and_then(Value::as_f64).unwrap_or(0.0),
            }
        };

        Some(Self { start, end, kind })
    }

    /// Serialize back to the canonical payload shape.
    pub fn to_json(&self) -> Value {
        let mut obj = json!({ "startDate": self.start });
        if let Some(end) = &self.end {
            obj["endDate"] = json!(end);
        }
        match &self.kind {
            SegmentKind::Summarized {
                deep,
                rem,
                core,
                awake,
            } => {
                obj["deep"] = json!(deep);
                obj["rem"] = json!(rem);
                obj["core"] = json!(core);
                obj["awake"] = json!(awake);
            }
            SegmentKind::Raw { phase, qty } => {
                obj["value"] = json!(phase);
                obj["qty"] = json!(qty);
            }
        }
        obj
    }

    /// Parse the start timestamp, if the raw string is a valid date.
    pub fn parse_start(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.start)
    }

    /// Parse the end timestamp, if present and valid.
    pub fn parse_end(&self) -> Option<DateTime<Utc>> {
        self.end.as_deref().and_then(parse_timestamp)
    }

    /// Sort segments ascending by parsed start time.
    ///
    /// Segments whose start string does not parse sort first, ordered among
    /// themselves by the raw string, so the result is deterministic for any
    /// input.
    pub fn sort_by_start(segments: &mut [SleepSegment]) {
        segments.sort_by(|a, b| match (a.parse_start(), b.parse_start()) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.start.cmp(&b.start)),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => a.start.cmp(&b.start),
        });
    }
}

/// Parse an ISO-8601 timestamp string.
///
/// Health export emits both strict RFC 3339 (`2024-01-01T23:00:00Z`) and a
/// space-separated variant (`2024-01-01 23:00:00 +0000`).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

// ============================================
// Derived sleep values
// ============================================

/// The `[start, end]` interval of the most recent sleep session.
///
/// Derived from the merged timeline on read, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Per-stage duration totals, in hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepStages {
    pub deep: f64,
    pub rem: f64,
    pub core: f64,
    pub awake: f64,
}

impl SleepStages {
    /// Total time asleep: deep + rem + core. Awake time is excluded.
    pub fn sleep_total(&self) -> f64 {
        self.deep + self.rem + self.core
    }
}

/// Categorical sleep quality label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    NoData,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl SleepQuality {
    /// Returns the identifier used in storage and JSON output
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepQuality::NoData => "no_data",
            SleepQuality::Poor => "poor",
            SleepQuality::Fair => "fair",
            SleepQuality::Good => "good",
            SleepQuality::Excellent => "excellent",
        }
    }

    /// Returns the display label for dashboards
    pub fn display_name(&self) -> &'static str {
        match self {
            SleepQuality::NoData => "No Data",
            SleepQuality::Poor => "Poor",
            SleepQuality::Fair => "Fair",
            SleepQuality::Good => "Good",
            SleepQuality::Excellent => "Excellent",
        }
    }
}

impl std::fmt::Display for SleepQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SleepQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_data" => Ok(SleepQuality::NoData),
            "poor" => Ok(SleepQuality::Poor),
            "fair" => Ok(SleepQuality::Fair),
            "good" => Ok(SleepQuality::Good),
            "excellent" => Ok(SleepQuality::Excellent),
            _ => Err(format!("unknown sleep quality: {}", s)),
        }
    }
}

// ============================================
// Metric samples
// ============================================

/// A single vital-sign reading.
///
/// Read-only: flattened out of stored health events by the read side,
/// never created directly by ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    /// Metric name (`respiratory_rate`, `blood_oxygen_saturation`, ...)
    pub metric_type: String,
    pub value: f64,
    pub unit: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A single heart-rate reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartRateSample {
    pub bpm: f64,
    pub timestamp: DateTime<Utc>,
}

// ============================================
// Health export payload
// ============================================

/// One named metric from a health export batch.
///
/// The entire sample array for a metric name is stored nested inside a
/// single Event; the read side flattens it back out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedMetric {
    pub name: String,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub data: Vec<Value>,
}

/// Top-level body of the health export webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthExportPayload {
    pub data: HealthExportMetrics,
}

/// Inner `data` object of the webhook body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthExportMetrics {
    #[serde(default)]
    pub metrics: Vec<NamedMetric>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_from_raw_json() {
        let seg = SleepSegment::from_json(&json!({
            "startDate": "2024-01-01T23:00:00Z",
            "endDate": "2024-01-02T00:00:00Z",
            "value": "Core",
            "qty": 60.0
        }))
        .unwrap();

        assert_eq!(seg.start, "2024-01-01T23:00:00Z");
        assert_eq!(seg.end.as_deref(), Some("2024-01-02T00:00:00Z"));
        assert_eq!(
            seg.kind,
            SegmentKind::Raw {
                phase: "Core".to_string(),
                qty: 60.0
            }
        );
    }

    #[test]
    fn test_segment_from_summarized_json() {
        let seg = SleepSegment::from_json(&json!({
            "date": "2024-01-02 07:00:00 +0000",
            "deep": 1.5,
            "rem": 2.0,
            "core": 4.0
        }))
        .unwrap();

        // `date` is accepted as the start key and kept raw
        assert_eq!(seg.start, "2024-01-02 07:00:00 +0000");
        assert_eq!(
            seg.kind,
            SegmentKind::Summarized {
                deep: 1.5,
                rem: 2.0,
                core: 4.0,
                awake: 0.0
            }
        );
    }

    #[test]
    fn test_segment_without_start_is_rejected() {
        assert!(SleepSegment::from_json(&json!({ "value": "Deep", "qty": 30.0 })).is_none());
    }

    #[test]
    fn test_segment_json_round_trip() {
        let original = json!({
            "startDate": "2024-01-01T23:00:00Z",
            "endDate": "2024-01-02T00:00:00Z",
            "value": "Deep",
            "qty": 30.0
        });
        let seg = SleepSegment::from_json(&original).unwrap();
        let seg2 = SleepSegment::from_json(&seg.to_json()).unwrap();
        assert_eq!(seg, seg2);
    }

    #[test]
    fn test_sort_by_start_is_chronological_not_lexical() {
        // "2024-01-02 03:00:00 +0100" precedes "2024-01-02T01:00:00Z" as a
        // string but not as an instant
        let mut segments = vec![
            SleepSegment {
                start: "2024-01-02 03:00:00 +0100".to_string(),
                end: None,
                kind: SegmentKind::Raw {
                    phase: "Core".to_string(),
                    qty: 10.0,
                },
            },
            SleepSegment {
                start: "2024-01-02T01:00:00Z".to_string(),
                end: None,
                kind: SegmentKind::Raw {
                    phase: "Deep".to_string(),
                    qty: 10.0,
                },
            },
        ];
        SleepSegment::sort_by_start(&mut segments);
        assert_eq!(segments[0].start, "2024-01-02T01:00:00Z");
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2024-01-01T23:00:00Z").is_some());
        assert!(parse_timestamp("2024-01-01 23:00:00 +0000").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn test_sleep_quality_round_trip() {
        for quality in [
            SleepQuality::NoData,
            SleepQuality::Poor,
            SleepQuality::Fair,
            SleepQuality::Good,
            SleepQuality::Excellent,
        ] {
            assert_eq!(quality.as_str().parse::<SleepQuality>().unwrap(), quality);
        }
    }

    #[test]
    fn test_payload_deserialization() {
        let payload: HealthExportPayload = serde_json::from_value(json!({
            "data": {
                "metrics": [
                    { "name": "heart_rate", "units": "bpm", "data": [] }
                ]
            }
        }))
        .unwrap();
        assert_eq!(payload.data.metrics.len(), 1);
        assert_eq!(payload.data.metrics[0].name, "heart_rate");
    }
}
