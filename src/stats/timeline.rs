use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::audit::AuditEntry;
use crate::error::HuntdeskError;
use crate::workflow::{STATUSES, Status, StatusTag};

/// Statuses left off the dashboard chart by default.
pub const DEFAULT_CHART_EXCLUDED: &[Status] =
    &[Status::Dead, Status::Deferred, Status::InitialIdea];

/// One point of the stacked chart: counts aligned with
/// [`StatusTimeline::labels`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineSample {
    pub at: DateTime<Utc>,
    pub counts: Vec<i64>,
}

impl TimelineSample {
    pub fn total(&self) -> i64 {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusTimeline {
    /// Displayed statuses, top of the stack first.
    pub statuses: Vec<Status>,
    pub labels: Vec<&'static str>,
    pub samples: Vec<TimelineSample>,
    pub target_count: Option<u32>,
}

impl StatusTimeline {
    pub fn with_target_count(mut self, target: Option<u32>) -> Self {
        self.target_count = target;
        self
    }

    pub fn last_sample_at(&self) -> Option<DateTime<Utc>> {
        self.samples.last().map(|s| s.at)
    }

    /// Keeps only samples no older than the last sample minus `window`.
    pub fn clipped(mut self, window: TimeWindow) -> Self {
        if let (TimeWindow::Last(span), Some(last)) = (window, self.last_sample_at()) {
            let start = last - span;
            self.samples.retain(|s| s.at >= start);
        }
        self
    }
}

/// Counts of puzzles in each status after every status event.
///
/// Entries are replayed in timestamp order, ties kept in log order. Excluded
/// statuses still take part in the bookkeeping (a puzzle moving out of one
/// decrements it) but are not displayed. Legacy codes are tracked the same
/// way and never displayed.
pub fn status_counts_over_time<'a, I>(entries: I, excluded: &[Status]) -> StatusTimeline
where
    I: IntoIterator<Item = &'a AuditEntry>,
{
    let statuses: Vec<Status> = STATUSES
        .iter()
        .rev()
        .copied()
        .filter(|s| !excluded.contains(s))
        .collect();

    let mut events: Vec<(&AuditEntry, &StatusTag)> = entries
        .into_iter()
        .filter_map(|e| e.status_change.as_ref().map(|tag| (e, tag)))
        .collect();
    events.sort_by_key(|(e, _)| e.timestamp);

    let mut counts: HashMap<&StatusTag, i64> = HashMap::new();
    let mut current: HashMap<u64, &StatusTag> = HashMap::new();
    let mut samples = Vec::with_capacity(events.len());

    for (entry, tag) in events {
        *counts.entry(tag).or_default() += 1;
        if let Some(previous) = current.insert(entry.puzzle_id, tag) {
            *counts.entry(previous).or_default() -= 1;
        }
        samples.push(TimelineSample {
            at: entry.timestamp,
            counts: statuses
                .iter()
                .map(|s| counts.get(&StatusTag::Known(*s)).copied().unwrap_or(0))
                .collect(),
        });
    }

    StatusTimeline {
        labels: statuses.iter().map(|s| s.display_name()).collect(),
        statuses,
        samples,
        target_count: None,
    }
}

/// How far back the dashboard chart looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    AllTime,
    Last(Duration),
}

impl FromStr for TimeWindow {
    type Err = HuntdeskError;

    /// Accepts `alltime` or `<n>d`, `<n>w`, `<n>m` where a month is 30 days.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "alltime" {
            return Ok(TimeWindow::AllTime);
        }
        let invalid = || HuntdeskError::Config(format!("invalid time window: {s:?}"));
        let split = s.char_indices().last().map_or(0, |(i, _)| i);
        let (amount, unit) = s.split_at(split);
        let n: i64 = amount.parse().map_err(|_| invalid())?;
        if n <= 0 {
            return Err(invalid());
        }
        let span = match unit {
            "d" => Duration::days(n),
            "w" => Duration::weeks(n),
            "m" => Duration::days(30 * n),
            _ => return Err(invalid()),
        };
        Ok(TimeWindow::Last(span))
    }
}
