//! Data repair: recompute each puzzle's `status_mtime` from its history.
//!
//! Older trackers did not tag status changes; they left system comments such
//! as "Status changed to Testsolving". Those are parsed back into statuses so
//! their timestamps count too.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::log::{AuditEntry, AuditLog};
use crate::error::HuntdeskError;
use crate::workflow::{Puzzle, Status, StatusTag};

const CREATED_PUZZLE: &str = "Created puzzle";
const STATUS_CHANGED_PREFIX: &str = "Status changed to ";

/// Parses a legacy system comment into the status it announced.
pub fn parse_legacy_comment(content: &str) -> Option<StatusTag> {
    if content == CREATED_PUZZLE {
        return Some(StatusTag::Known(Status::InitialIdea));
    }
    let name = content.strip_prefix(STATUS_CHANGED_PREFIX)?;
    match Status::from_display_name(name) {
        Some(status) => Some(StatusTag::Known(status)),
        None => {
            warn!(status = name, "Legacy status comment names an unknown status");
            None
        }
    }
}

/// The status an entry moved its puzzle into, from its tag or, for untagged
/// system comments, from the legacy text.
pub fn effective_status(entry: &AuditEntry) -> Option<StatusTag> {
    match &entry.status_change {
        Some(tag) => Some(tag.clone()),
        None if entry.is_system => parse_legacy_comment(&entry.content),
        None => None,
    }
}

/// Latest status-change timestamp per puzzle.
pub fn latest_status_changes(log: &AuditLog) -> BTreeMap<u64, DateTime<Utc>> {
    let mut latest: BTreeMap<u64, DateTime<Utc>> = BTreeMap::new();
    for entry in log.entries() {
        if effective_status(entry).is_some() {
            let slot = latest.entry(entry.puzzle_id).or_insert(entry.timestamp);
            if entry.timestamp > *slot {
                *slot = entry.timestamp;
            }
        }
    }
    latest
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MtimeUpdate {
    pub puzzle_id: u64,
    pub old: DateTime<Utc>,
    pub new: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct BackfillFailure {
    pub puzzle_id: u64,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct BackfillReport {
    pub updated: Vec<MtimeUpdate>,
    pub unchanged: Vec<u64>,
    pub failures: Vec<BackfillFailure>,
}

/// Sets one puzzle's mtime. Returns the update if the stored value drifted.
pub fn apply_mtime(
    puzzles: &mut BTreeMap<u64, Puzzle>,
    puzzle_id: u64,
    mtime: DateTime<Utc>,
) -> Result<Option<MtimeUpdate>, HuntdeskError> {
    let puzzle = puzzles
        .get_mut(&puzzle_id)
        .ok_or(HuntdeskError::PuzzleNotFound(puzzle_id))?;
    if puzzle.status_mtime == mtime {
        return Ok(None);
    }
    let old = puzzle.status_mtime;
    puzzle.status_mtime = mtime;
    Ok(Some(MtimeUpdate {
        puzzle_id,
        old,
        new: mtime,
    }))
}

/// Repairs every puzzle's `status_mtime` from the log. Puzzles are handled
/// one at a time; a failure on one is reported and the rest carry on.
/// `progress` is called with each puzzle id once it has been handled.
pub fn backfill_status_mtimes(
    log: &AuditLog,
    puzzles: &mut BTreeMap<u64, Puzzle>,
    mut progress: impl FnMut(u64),
) -> BackfillReport {
    let mut report = BackfillReport::default();
    for (puzzle_id, mtime) in latest_status_changes(log) {
        record_outcome(&mut report, puzzle_id, apply_mtime(puzzles, puzzle_id, mtime));
        progress(puzzle_id);
    }
    report
}

fn record_outcome(
    report: &mut BackfillReport,
    puzzle_id: u64,
    outcome: Result<Option<MtimeUpdate>, HuntdeskError>,
) {
    match outcome {
        Ok(Some(update)) => report.updated.push(update),
        Ok(None) => report.unchanged.push(puzzle_id),
        Err(err) => {
            warn!(puzzle_id, error = %err, "Skipping puzzle during mtime backfill");
            report.failures.push(BackfillFailure {
                puzzle_id,
                reason: err.to_string(),
            });
        }
    }
}
