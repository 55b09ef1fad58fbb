use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::puzzle::{Puzzle, StatusChange};
use super::status::Status;
use super::table::{Role, Transition, TransitionTable};
use crate::error::{HuntdeskError, Result};

/// How the engine treats a target status the table does not offer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionMode {
    /// Accept the target and log a warning. Matches the legacy tracker, where
    /// staff could push a puzzle anywhere.
    #[default]
    Permissive,
    /// Reject anything the table does not offer.
    Strict,
}

/// A transition as offered to a user: where it goes and what the button says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOption {
    pub status: Status,
    pub status_display: &'static str,
    pub description: String,
}

/// Queries the transition table and applies status changes to puzzles.
///
/// The engine only reports who a status is blocked on; deciding whether a
/// given user may press a button is the caller's job.
#[derive(Debug, Clone, Default)]
pub struct WorkflowEngine {
    table: TransitionTable,
    mode: TransitionMode,
}

impl WorkflowEngine {
    pub fn new(table: TransitionTable, mode: TransitionMode) -> Self {
        Self { table, mode }
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn mode(&self) -> TransitionMode {
        self.mode
    }

    pub fn blocker(&self, status: Status) -> Role {
        self.table.blocker(status)
    }

    /// Blocker for a raw code; unknown codes are blocked on nobody.
    pub fn blocker_of(&self, code: &str) -> Role {
        Status::from_code(code).map_or(Role::Nobody, |s| self.table.blocker(s))
    }

    pub fn transitions(&self, status: Status) -> &[Transition] {
        self.table.transitions(status)
    }

    /// Transitions for a raw code; unknown codes have none.
    pub fn transitions_of(&self, code: &str) -> &[Transition] {
        match Status::from_code(code) {
            Some(status) => self.table.transitions(status),
            None => &[],
        }
    }

    pub fn statuses_blocked_on(&self, role: Role) -> &BTreeSet<Status> {
        self.table.statuses_blocked_on(role)
    }

    pub fn options_for(&self, puzzle: &Puzzle) -> Vec<TransitionOption> {
        self.transitions(puzzle.status)
            .iter()
            .map(|t| TransitionOption {
                status: t.to,
                status_display: t.to.display_name(),
                description: t.label.clone(),
            })
            .collect()
    }

    /// Checks `from -> to` against the table under the configured mode.
    pub fn check(&self, from: Status, to: Status) -> Result<()> {
        if from == to || self.table.allows(from, to) {
            return Ok(());
        }
        match self.mode {
            TransitionMode::Strict => Err(HuntdeskError::InvalidTransition {
                from: from.code().to_string(),
                to: to.code().to_string(),
            }),
            TransitionMode::Permissive => {
                warn!(
                    from = from.code(),
                    to = to.code(),
                    "Accepting transition not offered by the table"
                );
                Ok(())
            }
        }
    }

    /// Moves `puzzle` to `to`.
    ///
    /// Returns `None` when the puzzle is already in `to`: nothing changes and
    /// no event should be recorded. Otherwise `status_mtime` becomes `at` and
    /// the returned change is what the caller records and publishes.
    pub fn apply_transition(
        &self,
        puzzle: &mut Puzzle,
        to: Status,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<StatusChange>> {
        let from = puzzle.status;
        if from == to {
            return Ok(None);
        }
        self.check(from, to)?;

        puzzle.status = to;
        puzzle.status_mtime = at;

        info!(
            puzzle_id = puzzle.id,
            from = from.code(),
            to = to.code(),
            actor,
            "Puzzle status changed"
        );

        Ok(Some(StatusChange {
            puzzle_id: puzzle.id,
            puzzle_title: puzzle.spoiler_free_title(),
            from,
            to,
            actor: actor.to_string(),
            at,
        }))
    }

    /// Like [`apply_transition`](Self::apply_transition), for a raw code
    /// straight from a request.
    pub fn apply_transition_code(
        &self,
        puzzle: &mut Puzzle,
        code: &str,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<StatusChange>> {
        let to: Status = code.parse()?;
        self.apply_transition(puzzle, to, actor, at)
    }

    /// Compare-and-swap variant: applies only if the puzzle is still in the
    /// status the caller last saw.
    pub fn apply_transition_if(
        &self,
        puzzle: &mut Puzzle,
        expected: Status,
        to: Status,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<StatusChange>> {
        if puzzle.status != expected {
            return Err(HuntdeskError::OptimisticLockFailure {
                puzzle_id: puzzle.id,
                expected: expected.code().to_string(),
                actual: puzzle.status.code().to_string(),
            });
        }
        self.apply_transition(puzzle, to, actor, at)
    }
}
