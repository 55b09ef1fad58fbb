//! Property-based tests for the status registry and the engine.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use super::status::{self, STATUSES, Status, UNKNOWN_RANK};
use super::{Puzzle, TransitionTable, WorkflowEngine};
use crate::audit::AuditLog;

fn any_status() -> impl Strategy<Value = Status> {
    prop::sample::select(STATUSES.to_vec())
}

/// Short strings that are never registry codes.
fn unknown_code() -> impl Strategy<Value = String> {
    "[A-Za-z?]{0,4}".prop_filter("must not be a registry code", |s| {
        Status::from_code(s).is_none()
    })
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

proptest! {
    #[test]
    fn ranks_are_declaration_order(idx in 0..STATUSES.len()) {
        let status = STATUSES[idx];
        prop_assert_eq!(status.rank(), idx as i32);
        prop_assert!(status.rank() >= 0);
        prop_assert_eq!(status::rank_of(status.code()), status.rank());
    }

    #[test]
    fn unknown_codes_fall_back(code in unknown_code()) {
        prop_assert_eq!(status::rank_of(&code), UNKNOWN_RANK);
        prop_assert_eq!(status::display_of(&code), code.as_str());
        prop_assert!(!status::past_writing(&code));
        prop_assert!(!status::past_testsolving(&code));
        prop_assert!(WorkflowEngine::default().transitions_of(&code).is_empty());
    }

    #[test]
    fn transition_targets_are_registry_statuses(status in any_status()) {
        let table = TransitionTable::default();
        for transition in table.transitions(status) {
            prop_assert!(STATUSES.contains(&transition.to));
            prop_assert_ne!(transition.to, status);
        }
    }

    #[test]
    fn same_status_transition_is_idempotent(status in any_status(), hours in 0i64..1000) {
        let engine = WorkflowEngine::default();
        let mut puzzle = Puzzle::new(7, "p", base_time()).with_status(status);
        let before = puzzle.clone();

        let change = engine
            .apply_transition(&mut puzzle, status, "x", base_time() + Duration::hours(hours))
            .unwrap();

        prop_assert!(change.is_none());
        prop_assert_eq!(puzzle, before);
    }

    #[test]
    fn replaying_the_log_yields_current_status(
        path in prop::collection::vec(any_status(), 1..30)
    ) {
        let engine = WorkflowEngine::default();
        let mut puzzle = Puzzle::new(1, "p", base_time());
        let mut log = AuditLog::new();
        log.record_transition(1, puzzle.status, "x", base_time()).unwrap();

        for (i, target) in path.iter().enumerate() {
            let at = base_time() + Duration::minutes(i as i64 + 1);
            let events_before = log.len();
            if let Some(change) = engine.apply_transition(&mut puzzle, *target, "x", at).unwrap() {
                prop_assert_eq!(puzzle.status_mtime, at);
                log.record_change(&change).unwrap();
                prop_assert_eq!(log.len(), events_before + 1);
            } else {
                prop_assert_eq!(log.len(), events_before);
            }
        }

        let replayed = log.latest_status(1).and_then(|tag| tag.status());
        prop_assert_eq!(replayed, Some(puzzle.status));
        prop_assert_eq!(log.last_status_change_at(1), Some(puzzle.status_mtime));
    }

    #[test]
    fn progress_predicates_exclude_dead_and_deferred(status in any_status()) {
        if matches!(status, Status::Dead | Status::Deferred) {
            prop_assert!(!status.past_writing());
            prop_assert!(!status.past_testsolving());
        }
        if status.past_testsolving() {
            prop_assert!(status.past_writing());
        }
        prop_assert!(!(status.is_pre_testsolving() && status.is_post_testsolving()));
    }
}
