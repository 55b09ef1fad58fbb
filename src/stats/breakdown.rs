use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::error::IntegrityViolation;
use crate::workflow::{Puzzle, Status};

/// Tags whose puzzles are not on the regular puzzle schedule.
pub const DEFAULT_NON_SCHEDULE_TAGS: &[&str] = &["meta", "navigation", "event"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownRow {
    pub status: Status,
    pub display: &'static str,
    pub count: i64,
    /// Puzzles in this status carrying each important tag.
    pub tag_counts: BTreeMap<String, i64>,
    /// Puzzles carrying none of the important tags. Never negative.
    pub rest: i64,
}

/// Current puzzle counts per status, split by important tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub rows: Vec<BreakdownRow>,
    pub past_writing: i64,
    pub past_testsolving: i64,
    pub violations: Vec<IntegrityViolation>,
}

impl StatusBreakdown {
    pub fn total(&self) -> i64 {
        self.rows.iter().map(|r| r.count).sum()
    }

    pub fn row(&self, status: Status) -> Option<&BreakdownRow> {
        self.rows.iter().find(|r| r.status == status)
    }
}

/// Cross-tabulates puzzles by status and by `important_tags`.
///
/// Only statuses with at least one puzzle get a row. The progress totals
/// leave out puzzles tagged with any of `non_schedule_tags` that is also
/// important, one subtraction per tag.
pub fn status_breakdown<'a, I>(
    puzzles: I,
    important_tags: &[String],
    non_schedule_tags: &[String],
) -> StatusBreakdown
where
    I: IntoIterator<Item = &'a Puzzle>,
{
    let mut totals: BTreeMap<Status, i64> = BTreeMap::new();
    let mut tagged: BTreeMap<Status, BTreeMap<String, i64>> = BTreeMap::new();

    for puzzle in puzzles {
        *totals.entry(puzzle.status).or_default() += 1;
        for tag in important_tags {
            if puzzle.tags.contains(tag) {
                *tagged
                    .entry(puzzle.status)
                    .or_default()
                    .entry(tag.clone())
                    .or_default() += 1;
            }
        }
    }

    let mut breakdown = StatusBreakdown {
        rows: Vec::with_capacity(totals.len()),
        past_writing: 0,
        past_testsolving: 0,
        violations: Vec::new(),
    };

    // BTreeMap over Status iterates in rank order.
    for (status, count) in totals {
        let tag_counts: BTreeMap<String, i64> = important_tags
            .iter()
            .map(|tag| {
                let n = tagged
                    .get(&status)
                    .and_then(|m| m.get(tag))
                    .copied()
                    .unwrap_or(0);
                (tag.clone(), n)
            })
            .collect();
        let tagged_total: i64 = tag_counts.values().sum();

        let rest = count - tagged_total;
        if rest < 0 {
            warn!(
                status = status.code(),
                total = count,
                tagged = tagged_total,
                "Tagged puzzles exceed status total"
            );
            breakdown.violations.push(IntegrityViolation::NegativeRemainder {
                status: status.display_name().to_string(),
                total: count,
                tagged: tagged_total,
            });
        }

        let off_schedule: i64 = tag_counts
            .iter()
            .filter(|(tag, _)| non_schedule_tags.contains(*tag))
            .map(|(_, n)| n)
            .sum();
        if status.past_writing() {
            breakdown.past_writing += count - off_schedule;
        }
        if status.past_testsolving() {
            breakdown.past_testsolving += count - off_schedule;
        }

        breakdown.rows.push(BreakdownRow {
            status,
            display: status.display_name(),
            count,
            tag_counts,
            rest: rest.max(0),
        });
    }

    breakdown
}
