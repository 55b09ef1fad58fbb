use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, HuntdeskError>;

#[derive(Debug, Error)]
pub enum HuntdeskError {
    #[error("Unknown status code: {0:?}")]
    UnknownStatus(String),

    #[error("Transition from {from} to {to} is not offered by the transition table")]
    InvalidTransition { from: String, to: String },

    #[error("Puzzle #{puzzle_id} changed underneath us: expected status {expected}, found {actual}")]
    OptimisticLockFailure {
        puzzle_id: u64,
        expected: String,
        actual: String,
    },

    #[error("Puzzle not found: #{0}")]
    PuzzleNotFound(u64),

    #[error("Testsolve session not found: #{0}")]
    SessionNotFound(u64),

    #[error("{user} is not participating in testsolve session #{session_id}")]
    NotParticipating { session_id: u64, user: String },

    #[error("Audit entry not found: {0}")]
    EntryNotFound(uuid::Uuid),

    #[error("Event for puzzle #{puzzle_id} at {at} precedes the latest recorded event at {latest}")]
    NonMonotonicTimestamp {
        puzzle_id: u64,
        at: DateTime<Utc>,
        latest: DateTime<Utc>,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A data-integrity problem found while aggregating statistics.
///
/// These are returned alongside a report rather than failing it, so one bad
/// row never takes down the whole dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum IntegrityViolation {
    /// Tag sub-counts for a status exceed its total (e.g. a puzzle carrying two
    /// important tags at once).
    #[error("Status {status}: tagged puzzles ({tagged}) exceed total ({total})")]
    NegativeRemainder {
        status: String,
        total: i64,
        tagged: i64,
    },
    /// A puzzle's status events are not in chronological order.
    #[error("Puzzle #{puzzle_id}: status events out of order")]
    OutOfOrderEvents { puzzle_id: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_display() {
        let err = HuntdeskError::InvalidTransition {
            from: "D".into(),
            to: "T".into(),
        };
        assert_eq!(
            err.to_string(),
            "Transition from D to T is not offered by the transition table"
        );
    }

    #[test]
    fn lock_failure_display() {
        let err = HuntdeskError::OptimisticLockFailure {
            puzzle_id: 7,
            expected: "T".into(),
            actual: "R".into(),
        };
        assert_eq!(
            err.to_string(),
            "Puzzle #7 changed underneath us: expected status T, found R"
        );
    }

    #[test]
    fn integrity_violation_display() {
        let v = IntegrityViolation::NegativeRemainder {
            status: "Writing (answer assigned)".into(),
            total: 2,
            tagged: 3,
        };
        assert_eq!(
            v.to_string(),
            "Status Writing (answer assigned): tagged puzzles (3) exceed total (2)"
        );
        assert_eq!(
            IntegrityViolation::OutOfOrderEvents { puzzle_id: 4 }.to_string(),
            "Puzzle #4: status events out of order"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HuntdeskError>();
    }
}
