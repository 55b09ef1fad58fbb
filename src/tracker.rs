//! The façade callers drive: it moves puzzles through the engine, records
//! every change in the audit log and runs the post-transition hooks.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::audit::{AuditEntry, BackfillReport, backfill_status_mtimes, latest_status_changes};
use crate::error::{HuntdeskError, Result};
use crate::hooks::{self, HookEffect, Notification, TransitionHook};
use crate::notify::{StatusSubscription, SubscriptionNotifier};
use crate::store::TrackerState;
use crate::testsolve::{GuessOutcome, SessionCascade, TestsolveSession};
use crate::workflow::{Puzzle, Status, StatusChange, StatusTag, WorkflowEngine};

/// What a status change request did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// `None` when the puzzle was already in the requested status.
    pub change: Option<StatusChange>,
    /// Messages for the mail collaborator to deliver.
    pub notifications: Vec<Notification>,
}

pub struct Tracker {
    engine: WorkflowEngine,
    state: TrackerState,
}

impl Tracker {
    pub fn new(engine: WorkflowEngine, state: TrackerState) -> Self {
        Self { engine, state }
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn into_state(self) -> TrackerState {
        self.state
    }

    pub fn puzzles(&self) -> impl Iterator<Item = &Puzzle> {
        self.state.puzzles.values()
    }

    pub fn puzzle(&self, id: u64) -> Result<&Puzzle> {
        self.state
            .puzzles
            .get(&id)
            .ok_or(HuntdeskError::PuzzleNotFound(id))
    }

    pub fn session(&self, id: u64) -> Result<&TestsolveSession> {
        self.state
            .sessions
            .get(&id)
            .ok_or(HuntdeskError::SessionNotFound(id))
    }

    /// Adds a puzzle in the initial status, authored by `author`.
    pub fn create_puzzle(&mut self, name: &str, author: &str, at: DateTime<Utc>) -> Result<u64> {
        let id = self.state.allocate_puzzle_id();
        let puzzle = Puzzle::new(id, name, at).with_author(author);
        self.state.log.append(
            AuditEntry::system(id, author, "Created puzzle", at).with_status_change(puzzle.status),
        )?;
        self.state.puzzles.insert(id, puzzle);
        debug!(puzzle_id = id, author, "Created puzzle");
        Ok(id)
    }

    /// Moves a puzzle to `to`, records it and runs the hooks.
    pub fn change_status(
        &mut self,
        id: u64,
        to: Status,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<TransitionOutcome> {
        self.transition(id, None, to, actor, at, AuditEntry::from_change)
    }

    /// Like [`change_status`](Self::change_status), failing if the puzzle is
    /// no longer in `expected`.
    pub fn change_status_if(
        &mut self,
        id: u64,
        expected: Status,
        to: Status,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<TransitionOutcome> {
        self.transition(id, Some(expected), to, actor, at, AuditEntry::from_change)
    }

    pub fn comment(
        &mut self,
        id: u64,
        author: &str,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<Uuid> {
        self.puzzle(id)?;
        let entry = self
            .state
            .log
            .append(AuditEntry::comment(id, author, content, at))?;
        Ok(entry.id)
    }

    /// A comment that may also move the puzzle. An unrecognised code is
    /// dropped with a warning and the comment is kept as a plain one.
    pub fn comment_with_status(
        &mut self,
        id: u64,
        author: &str,
        content: &str,
        code: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<TransitionOutcome> {
        let target = code.and_then(|c| {
            let status = Status::from_code(c);
            if status.is_none() {
                warn!(puzzle_id = id, code = c, "Ignoring unknown status on comment");
            }
            status
        });

        let Some(to) = target else {
            self.comment(id, author, content, at)?;
            return Ok(TransitionOutcome::default());
        };

        let outcome = self.transition(id, None, to, author, at, |change| {
            AuditEntry::comment(change.puzzle_id, author, content, change.at)
                .with_status_change(change.to)
        })?;
        if outcome.change.is_none() {
            self.comment(id, author, content, at)?;
        }
        Ok(outcome)
    }

    /// Reconstructs the status a puzzle had at `at` from its history.
    pub fn status_at(&self, id: u64, at: DateTime<Utc>) -> Result<StatusTag> {
        self.puzzle(id)?;
        Ok(self
            .state
            .log
            .reconstruct_status_at(id, at, Status::InitialIdea))
    }

    pub fn history(&self, id: u64) -> Vec<&AuditEntry> {
        self.state.log.for_puzzle(id).collect()
    }

    pub fn open_session(
        &mut self,
        puzzle_id: u64,
        user: &str,
        joinable: bool,
        at: DateTime<Utc>,
    ) -> Result<u64> {
        self.puzzle(puzzle_id)?;
        let id = self.state.allocate_session_id();
        let mut session = TestsolveSession::new(id, puzzle_id, at, joinable);
        session.join(user);
        self.state.log.append(
            AuditEntry::system(puzzle_id, user, format!("Created testsolve session #{id}"), at)
                .with_session(id),
        )?;
        self.state.sessions.insert(id, session);
        Ok(id)
    }

    /// Returns whether `user` was newly added.
    pub fn join_session(&mut self, session_id: u64, user: &str, at: DateTime<Utc>) -> Result<bool> {
        let mut session = self.session(session_id)?.clone();
        let Some(comment) = session.join(user) else {
            return Ok(false);
        };
        self.state.log.append(
            AuditEntry::system(session.puzzle_id, user, comment, at).with_session(session_id),
        )?;
        self.state.sessions.insert(session_id, session);
        Ok(true)
    }

    pub fn set_joinable(&mut self, session_id: u64, joinable: bool) -> Result<()> {
        self.state
            .sessions
            .get_mut(&session_id)
            .ok_or(HuntdeskError::SessionNotFound(session_id))?
            .set_joinable(joinable);
        Ok(())
    }

    pub fn guess(
        &mut self,
        session_id: u64,
        user: &str,
        guess: &str,
        at: DateTime<Utc>,
    ) -> Result<GuessOutcome> {
        let mut session = self.session(session_id)?.clone();
        let puzzle = self.puzzle(session.puzzle_id)?;

        let outcome = session.guess(user, guess, &puzzle.answers, at)?;
        let entry = AuditEntry::system(session.puzzle_id, user, outcome.comment.clone(), at)
            .with_session(session_id);
        self.state.log.append(entry)?;
        self.state.sessions.insert(session_id, session);
        Ok(outcome)
    }

    /// Subscribes `user` to puzzles entering `status`. Returns `false` if
    /// they already were.
    pub fn subscribe(&mut self, user: &str, email: &str, status: Status) -> bool {
        let exists = self
            .state
            .subscriptions
            .iter()
            .any(|s| s.user == user && s.status == status);
        if exists {
            return false;
        }
        self.state.subscriptions.push(StatusSubscription {
            user: user.to_string(),
            email: email.to_string(),
            status,
        });
        true
    }

    /// Number of puzzles the backfill will look at.
    pub fn backfill_len(&self) -> usize {
        latest_status_changes(&self.state.log).len()
    }

    /// Repairs `status_mtime` for every puzzle from the log, calling
    /// `progress` after each one.
    pub fn backfill(&mut self, progress: impl FnMut(u64)) -> BackfillReport {
        backfill_status_mtimes(&self.state.log, &mut self.state.puzzles, progress)
    }

    fn transition(
        &mut self,
        id: u64,
        expected: Option<Status>,
        to: Status,
        actor: &str,
        at: DateTime<Utc>,
        entry_for: impl FnOnce(&StatusChange) -> AuditEntry,
    ) -> Result<TransitionOutcome> {
        // Work on a copy so a rejected log append leaves the puzzle untouched.
        let mut updated = self.puzzle(id)?.clone();
        let change = match expected {
            Some(expected) => self
                .engine
                .apply_transition_if(&mut updated, expected, to, actor, at)?,
            None => self.engine.apply_transition(&mut updated, to, actor, at)?,
        };
        let Some(change) = change else {
            return Ok(TransitionOutcome::default());
        };

        self.state.log.append(entry_for(&change))?;
        self.state.puzzles.insert(id, updated);

        let notifications = self.run_hooks(&change)?;
        Ok(TransitionOutcome {
            change: Some(change),
            notifications,
        })
    }

    fn run_hooks(&mut self, change: &StatusChange) -> Result<Vec<Notification>> {
        let effects = {
            let mut cascade = SessionCascade::new(&mut self.state.sessions);
            let mut notifier = SubscriptionNotifier::new(&self.state.subscriptions);
            let mut hooks: [&mut dyn TransitionHook; 2] = [&mut cascade, &mut notifier];
            hooks::dispatch(&mut hooks, change)
        };

        let mut notifications = Vec::new();
        for effect in effects {
            match effect {
                HookEffect::SystemComment {
                    puzzle_id,
                    content,
                    testsolve_session,
                } => {
                    let mut entry =
                        AuditEntry::system(puzzle_id, change.actor.clone(), content, change.at);
                    entry.testsolve_session = testsolve_session;
                    self.state.log.append(entry)?;
                }
                HookEffect::Notify(notification) => notifications.push(notification),
            }
        }
        Ok(notifications)
    }
}
