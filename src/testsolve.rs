//! Testsolve sessions: groups of people attempting a puzzle, and the
//! cascade that stops advertising them once the puzzle leaves testsolving.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HuntdeskError, Result};
use crate::hooks::{HookEffect, TransitionHook};
use crate::workflow::{Status, StatusChange};

pub const CASCADE_COMMENT: &str =
    "Puzzle status changed, automatically marking session as no longer joinable";

/// Upper-cases and strips everything that is not a letter or digit, so
/// "Hello, World!" and "HELLOWORLD" compare equal.
pub fn normalize_answer(answer: &str) -> String {
    answer
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guess {
    pub user: String,
    pub guess: String,
    pub correct: bool,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestsolveSession {
    pub id: u64,
    pub puzzle_id: u64,
    pub started: DateTime<Utc>,
    /// Whether the session is advertised to people who might join it.
    pub joinable: bool,
    #[serde(default)]
    pub participants: BTreeSet<String>,
    #[serde(default)]
    pub guesses: Vec<Guess>,
}

/// What a guess did, and the system comment to record for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessOutcome {
    pub correct: bool,
    pub closed_session: bool,
    pub comment: String,
}

impl TestsolveSession {
    pub fn new(id: u64, puzzle_id: u64, started: DateTime<Utc>, joinable: bool) -> Self {
        Self {
            id,
            puzzle_id,
            started,
            joinable,
            participants: BTreeSet::new(),
            guesses: Vec::new(),
        }
    }

    pub fn is_participant(&self, user: &str) -> bool {
        self.participants.contains(user)
    }

    /// Adds `user` to the session. Returns the comment to record, or `None`
    /// if they were already in it.
    pub fn join(&mut self, user: &str) -> Option<String> {
        if !self.participants.insert(user.to_string()) {
            return None;
        }
        Some(format!("Joined testsolve session #{}", self.id))
    }

    pub fn set_joinable(&mut self, joinable: bool) {
        self.joinable = joinable;
    }

    /// Records a guess against the puzzle's answers. A correct guess on a
    /// joinable session also stops advertising it.
    pub fn guess(
        &mut self,
        user: &str,
        guess: &str,
        answers: &[String],
        at: DateTime<Utc>,
    ) -> Result<GuessOutcome> {
        if !self.is_participant(user) {
            return Err(HuntdeskError::NotParticipating {
                session_id: self.id,
                user: user.to_string(),
            });
        }

        let normalized = normalize_answer(guess);
        let correct = answers.iter().any(|a| normalize_answer(a) == normalized);
        self.guesses.push(Guess {
            user: user.to_string(),
            guess: guess.to_string(),
            correct,
            at,
        });

        if correct && self.joinable {
            self.joinable = false;
            return Ok(GuessOutcome {
                correct,
                closed_session: true,
                comment: format!(
                    "Correct answer: {guess}. Automatically marking session as no longer joinable"
                ),
            });
        }

        let verdict = if correct { "Correct" } else { "Incorrect" };
        Ok(GuessOutcome {
            correct,
            closed_session: false,
            comment: format!("{verdict} answer guess: {guess}"),
        })
    }
}

/// Closes every joinable session of a puzzle that leaves testsolving.
pub struct SessionCascade<'a> {
    sessions: &'a mut BTreeMap<u64, TestsolveSession>,
}

impl<'a> SessionCascade<'a> {
    pub fn new(sessions: &'a mut BTreeMap<u64, TestsolveSession>) -> Self {
        Self { sessions }
    }
}

impl TransitionHook for SessionCascade<'_> {
    fn name(&self) -> &'static str {
        "session_cascade"
    }

    fn on_status_change(&mut self, change: &StatusChange) -> Vec<HookEffect> {
        if change.to == Status::Testsolving {
            return Vec::new();
        }
        self.sessions
            .values_mut()
            .filter(|s| s.puzzle_id == change.puzzle_id && s.joinable)
            .map(|session| {
                session.joinable = false;
                HookEffect::SystemComment {
                    puzzle_id: change.puzzle_id,
                    content: CASCADE_COMMENT.to_string(),
                    testsolve_session: Some(session.id),
                }
            })
            .collect()
    }
}
