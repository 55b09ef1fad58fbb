use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::audit::AuditEntry;
use crate::error::IntegrityViolation;
use crate::workflow::StatusTag;
use crate::workflow::status::rank_of;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDuration {
    pub status: StatusTag,
    pub total: Duration,
    /// Puzzles that spent any time in this status.
    pub puzzles: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationReport {
    /// Per status, in rank order; legacy codes last.
    pub per_status: Vec<StatusDuration>,
    pub pre_testsolving: Duration,
    pub post_testsolving: Duration,
    pub puzzles: usize,
    pub violations: Vec<IntegrityViolation>,
}

impl DurationReport {
    pub fn total_for(&self, code: &str) -> Duration {
        self.per_status
            .iter()
            .find(|d| d.status.code() == code)
            .map_or(Duration::zero(), |d| d.total)
    }
}

/// Time every puzzle spent in each status, from its tagged audit entries.
///
/// A puzzle's last status runs until `now`. A puzzle whose events go
/// backwards in time is left out and reported; the others still count.
pub fn duration_aggregates<'a, I>(entries: I, now: DateTime<Utc>) -> DurationReport
where
    I: IntoIterator<Item = &'a AuditEntry>,
{
    let mut by_puzzle: BTreeMap<u64, Vec<(DateTime<Utc>, &StatusTag)>> = BTreeMap::new();
    for entry in entries {
        if let Some(tag) = &entry.status_change {
            by_puzzle
                .entry(entry.puzzle_id)
                .or_default()
                .push((entry.timestamp, tag));
        }
    }

    let mut totals: BTreeMap<String, (StatusTag, Duration, usize)> = BTreeMap::new();
    let mut report = DurationReport {
        per_status: Vec::new(),
        pre_testsolving: Duration::zero(),
        post_testsolving: Duration::zero(),
        puzzles: 0,
        violations: Vec::new(),
    };

    for (puzzle_id, events) in by_puzzle {
        if events.windows(2).any(|w| w[1].0 < w[0].0) {
            warn!(puzzle_id, "Skipping puzzle with out-of-order status events");
            report
                .violations
                .push(IntegrityViolation::OutOfOrderEvents { puzzle_id });
            continue;
        }
        report.puzzles += 1;

        for (i, (start, tag)) in events.iter().enumerate() {
            let end = events.get(i + 1).map_or(now, |(next, _)| *next);
            let spent = (end - *start).max(Duration::zero());

            let slot = totals
                .entry(tag.code().to_string())
                .or_insert_with(|| ((*tag).clone(), Duration::zero(), 0));
            slot.1 += spent;
            slot.2 += 1;

            if let Some(status) = tag.status() {
                if status.is_pre_testsolving() {
                    report.pre_testsolving += spent;
                } else if status.is_post_testsolving() {
                    report.post_testsolving += spent;
                }
            }
        }
    }

    report.per_status = totals
        .into_values()
        .map(|(status, total, puzzles)| StatusDuration {
            status,
            total,
            puzzles,
        })
        .collect();
    report
        .per_status
        .sort_by_key(|d| (d.status.status().is_none(), rank_of(d.status.code())));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::Status;
    use chrono::TimeZone;

    fn t(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    }

    fn event(puzzle_id: u64, status: Status, hour: i64) -> AuditEntry {
        AuditEntry::system(puzzle_id, "x", "", t(hour)).with_status_change(status)
    }

    #[test]
    fn sums_time_per_status() {
        let entries = vec![
            event(1, Status::Writing, 0),
            event(1, Status::Testsolving, 10),
            event(1, Status::NeedsSolution, 15),
            event(2, Status::Writing, 2),
        ];
        let report = duration_aggregates(&entries, t(20));

        assert_eq!(report.puzzles, 2);
        // Puzzle 1 writes for 10h, puzzle 2 is still writing after 18h.
        assert_eq!(report.total_for("W"), Duration::hours(28));
        assert_eq!(report.total_for("T"), Duration::hours(5));
        assert_eq!(report.total_for("NS"), Duration::hours(5));
        assert_eq!(report.total_for("D"), Duration::zero());
        assert_eq!(report.pre_testsolving, Duration::hours(28));
        assert_eq!(report.post_testsolving, Duration::hours(5));

        let order: Vec<_> = report.per_status.iter().map(|d| d.status.code()).collect();
        assert_eq!(order, vec!["W", "T", "NS"]);
        assert_eq!(report.per_status[0].puzzles, 2);
    }

    #[test]
    fn done_is_neither_pre_nor_post() {
        let entries = vec![event(1, Status::NeedsCopyEdits, 0), event(1, Status::Done, 1)];
        let report = duration_aggregates(&entries, t(100));
        assert_eq!(report.post_testsolving, Duration::hours(1));
        assert_eq!(report.total_for("D"), Duration::hours(99));
    }

    #[test]
    fn out_of_order_puzzle_is_skipped_and_reported() {
        let entries = vec![
            event(1, Status::Writing, 5),
            event(1, Status::Testsolving, 3),
            event(2, Status::Writing, 0),
        ];
        let report = duration_aggregates(&entries, t(4));

        assert_eq!(report.puzzles, 1);
        assert_eq!(
            report.violations,
            vec![IntegrityViolation::OutOfOrderEvents { puzzle_id: 1 }]
        );
        assert_eq!(report.total_for("W"), Duration::hours(4));
        assert_eq!(report.total_for("T"), Duration::zero());
    }

    #[test]
    fn legacy_codes_sort_last() {
        let entries = vec![
            AuditEntry::system(1, "x", "", t(0)).with_status_change("PS"),
            event(1, Status::Done, 2),
        ];
        let report = duration_aggregates(&entries, t(3));
        let order: Vec<_> = report.per_status.iter().map(|d| d.status.code()).collect();
        assert_eq!(order, vec!["D", "PS"]);
        assert_eq!(report.total_for("PS"), Duration::hours(2));
    }
}
