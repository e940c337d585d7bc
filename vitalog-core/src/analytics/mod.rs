//! Analytics module for vitalog
//!
//! Derived, regenerable views over the event store:
//! - Sleep window resolution from the merged segment timeline
//! - Windowed averaging of vital metrics against that window
//! - Sleep quality classification
//! - Overview and nightly-history assembly for the dashboard
//!
//! Nothing here writes to the store; every view is recomputed from events
//! on each read.

pub mod matcher;
pub mod overview;
pub mod quality;
pub mod samples;
pub mod stages;
pub mod window;

pub use matcher::{average_in_window, heart_rate_in_window, RELAXED_WINDOW_OFFSET_HOURS};
pub use overview::{sleep_history, sleep_overview, RelatedMetrics, SleepNight, SleepOverview};
pub use quality::classify;
pub use samples::{heart_rate_samples, metric_samples, sleep_segments_since};
pub use stages::stage_totals;
pub use window::resolve_window;
