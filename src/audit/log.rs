use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HuntdeskError, Result};
use crate::workflow::{Status, StatusChange, StatusTag};

/// One entry in a puzzle's history: a comment, a system note, or a status
/// change (or a comment that also changed the status).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub puzzle_id: u64,
    pub timestamp: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub author: String,
    pub is_system: bool,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testsolve_session: Option<u64>,
    /// The status the puzzle entered, if this entry records a change.
    /// History only; the puzzle itself remains the source of truth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_change: Option<StatusTag>,
}

impl AuditEntry {
    pub fn comment(
        puzzle_id: u64,
        author: impl Into<String>,
        content: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            puzzle_id,
            timestamp: at,
            last_updated: at,
            author: author.into(),
            is_system: false,
            content: content.into(),
            testsolve_session: None,
            status_change: None,
        }
    }

    pub fn system(
        puzzle_id: u64,
        author: impl Into<String>,
        content: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            is_system: true,
            ..Self::comment(puzzle_id, author, content, at)
        }
    }

    /// The system entry recording a committed status change.
    pub fn from_change(change: &StatusChange) -> Self {
        Self::system(change.puzzle_id, change.actor.clone(), "", change.at)
            .with_status_change(change.to)
    }

    pub fn with_status_change(mut self, status: impl Into<StatusTag>) -> Self {
        self.status_change = Some(status.into());
        self
    }

    pub fn with_session(mut self, session_id: u64) -> Self {
        self.testsolve_session = Some(session_id);
        self
    }

    pub fn is_status_change(&self) -> bool {
        self.status_change.is_some()
    }
}

/// Append-only history of every puzzle.
///
/// Entries are never removed, and the status tag of an entry never changes
/// once recorded. Within one puzzle, timestamps never go backwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in the order they were recorded.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn for_puzzle(&self, puzzle_id: u64) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(move |e| e.puzzle_id == puzzle_id)
    }

    pub fn status_events(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(|e| e.is_status_change())
    }

    pub fn get(&self, id: Uuid) -> Option<&AuditEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn latest_timestamp(&self, puzzle_id: u64) -> Option<DateTime<Utc>> {
        self.for_puzzle(puzzle_id).map(|e| e.timestamp).max()
    }

    pub fn append(&mut self, entry: AuditEntry) -> Result<&AuditEntry> {
        if let Some(latest) = self.latest_timestamp(entry.puzzle_id) {
            if entry.timestamp < latest {
                return Err(HuntdeskError::NonMonotonicTimestamp {
                    puzzle_id: entry.puzzle_id,
                    at: entry.timestamp,
                    latest,
                });
            }
        }
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Records that `puzzle_id` entered `status` at `at`.
    pub fn record_transition(
        &mut self,
        puzzle_id: u64,
        status: Status,
        author: &str,
        at: DateTime<Utc>,
    ) -> Result<&AuditEntry> {
        self.append(AuditEntry::system(puzzle_id, author, "", at).with_status_change(status))
    }

    pub fn record_change(&mut self, change: &StatusChange) -> Result<&AuditEntry> {
        self.append(AuditEntry::from_change(change))
    }

    /// Rewrites the text of an entry. The status tag is left alone.
    pub fn edit_content(
        &mut self,
        id: Uuid,
        content: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(HuntdeskError::EntryNotFound(id))?;
        entry.content = content.into();
        entry.last_updated = at;
        Ok(())
    }

    /// The status a puzzle had at `at`, replaying its tagged entries up to
    /// and including that instant. `None` if nothing was recorded by then.
    pub fn status_at(&self, puzzle_id: u64, at: DateTime<Utc>) -> Option<&StatusTag> {
        self.for_puzzle(puzzle_id)
            .filter(|e| e.timestamp <= at)
            .filter_map(|e| e.status_change.as_ref())
            .last()
    }

    /// Like [`status_at`](Self::status_at), falling back to the puzzle's
    /// initial status when no change precedes `at`.
    pub fn reconstruct_status_at(
        &self,
        puzzle_id: u64,
        at: DateTime<Utc>,
        initial: Status,
    ) -> StatusTag {
        self.status_at(puzzle_id, at)
            .cloned()
            .unwrap_or(StatusTag::Known(initial))
    }

    pub fn latest_status(&self, puzzle_id: u64) -> Option<&StatusTag> {
        self.for_puzzle(puzzle_id)
            .filter_map(|e| e.status_change.as_ref())
            .last()
    }

    pub fn last_status_change_at(&self, puzzle_id: u64) -> Option<DateTime<Utc>> {
        self.for_puzzle(puzzle_id)
            .filter(|e| e.is_status_change())
            .map(|e| e.timestamp)
            .last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    }

    fn sample_log() -> AuditLog {
        let mut log = AuditLog::new();
        log.record_transition(1, Status::InitialIdea, "a", t(0)).unwrap();
        log.append(AuditEntry::comment(1, "b", "looks fun", t(1))).unwrap();
        log.record_transition(1, Status::AwaitingEditor, "a", t(2)).unwrap();
        log.record_transition(2, Status::InitialIdea, "c", t(3)).unwrap();
        log.record_transition(1, Status::IdeaInDevelopment, "e", t(5)).unwrap();
        log
    }

    #[test]
    fn status_at_replays_up_to_instant() {
        let log = sample_log();
        assert_eq!(log.status_at(1, t(0)).unwrap(), &StatusTag::Known(Status::InitialIdea));
        assert_eq!(log.status_at(1, t(1)).unwrap(), &StatusTag::Known(Status::InitialIdea));
        assert_eq!(log.status_at(1, t(2)).unwrap(), &StatusTag::Known(Status::AwaitingEditor));
        assert_eq!(log.status_at(1, t(4)).unwrap(), &StatusTag::Known(Status::AwaitingEditor));
        assert_eq!(
            log.status_at(1, t(10)).unwrap(),
            &StatusTag::Known(Status::IdeaInDevelopment)
        );
    }

    #[test]
    fn reconstruct_falls_back_to_initial() {
        let log = sample_log();
        assert_eq!(
            log.reconstruct_status_at(2, t(1), Status::InitialIdea),
            StatusTag::Known(Status::InitialIdea)
        );
        assert_eq!(
            log.reconstruct_status_at(42, t(100), Status::Testsolving),
            StatusTag::Known(Status::Testsolving)
        );
    }

    #[test]
    fn latest_status_matches_last_tag() {
        let log = sample_log();
        assert_eq!(
            log.latest_status(1),
            Some(&StatusTag::Known(Status::IdeaInDevelopment))
        );
        assert_eq!(log.last_status_change_at(1), Some(t(5)));
        assert_eq!(log.last_status_change_at(99), None);
    }

    #[test]
    fn rejects_backwards_timestamps_per_puzzle() {
        let mut log = sample_log();
        let err = log
            .record_transition(1, Status::Writing, "a", t(4))
            .unwrap_err();
        assert!(matches!(err, HuntdeskError::NonMonotonicTimestamp { puzzle_id: 1, .. }));

        // Other puzzles keep their own clocks.
        log.record_transition(3, Status::InitialIdea, "a", t(1)).unwrap();
        // Equal timestamps are allowed.
        log.record_transition(1, Status::Writing, "a", t(5)).unwrap();
    }

    #[test]
    fn editing_content_keeps_status_tag() {
        let mut log = AuditLog::new();
        let id = log
            .append(
                AuditEntry::comment(1, "a", "moving on", t(0)).with_status_change(Status::Writing),
            )
            .unwrap()
            .id;

        log.edit_content(id, "moving on!", t(1)).unwrap();
        let entry = log.get(id).unwrap();
        assert_eq!(entry.content, "moving on!");
        assert_eq!(entry.last_updated, t(1));
        assert_eq!(entry.timestamp, t(0));
        assert_eq!(entry.status_change, Some(StatusTag::Known(Status::Writing)));

        assert!(matches!(
            log.edit_content(Uuid::new_v4(), "x", t(2)),
            Err(HuntdeskError::EntryNotFound(_))
        ));
    }

    #[test]
    fn log_serializes_as_plain_list() {
        let log = sample_log();
        let json = serde_json::to_string(&log).unwrap();
        assert!(json.starts_with('['));
        let back: AuditLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);
    }
}
