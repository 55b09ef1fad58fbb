//! Read-only reports over puzzles and their history.
//!
//! Nothing here mutates state. Integrity problems in the data come back as
//! [`IntegrityViolation`](crate::error::IntegrityViolation) values next to
//! the numbers so one bad puzzle never hides the rest.

mod breakdown;
mod dashboard;
mod durations;
mod timeline;

pub use breakdown::{BreakdownRow, DEFAULT_NON_SCHEDULE_TAGS, StatusBreakdown, status_breakdown};
pub use dashboard::{EditorWorkload, Inbox, editor_workload, inbox};
pub use durations::{DurationReport, StatusDuration, duration_aggregates};
pub use timeline::{
    DEFAULT_CHART_EXCLUDED, StatusTimeline, TimeWindow, TimelineSample, status_counts_over_time,
};
