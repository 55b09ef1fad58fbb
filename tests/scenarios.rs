//! End-to-end workflows through the public API.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};

use huntdesk::audit::AuditEntry;
use huntdesk::stats::{self, DEFAULT_CHART_EXCLUDED};
use huntdesk::store::TrackerState;
use huntdesk::testsolve::CASCADE_COMMENT;
use huntdesk::tracker::Tracker;
use huntdesk::workflow::{Puzzle, Role, Status, StatusTag, WorkflowEngine};

fn t(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn tracker() -> Tracker {
    Tracker::new(WorkflowEngine::default(), TrackerState::default())
}

#[test]
fn new_idea_goes_to_awaiting_editor() {
    let mut tracker = tracker();
    let id = tracker.create_puzzle("Cryptic Zoo", "ann", t(0)).unwrap();
    assert_eq!(tracker.puzzle(id).unwrap().status.rank(), 0);

    let outcome = tracker
        .change_status(id, Status::AwaitingEditor, "ann", t(30))
        .unwrap();

    let puzzle = tracker.puzzle(id).unwrap();
    assert_eq!(puzzle.status, Status::AwaitingEditor);
    assert_eq!(puzzle.status_mtime, t(30));
    assert!(outcome.change.is_some());

    let events: Vec<&AuditEntry> = tracker
        .history(id)
        .into_iter()
        .filter(|e| e.timestamp == t(30))
        .collect();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].status_change,
        Some(StatusTag::Known(Status::AwaitingEditor))
    );
    assert_eq!(tracker.engine().blocker(Status::AwaitingEditor), Role::Editors);
}

#[test]
fn leaving_testsolving_closes_joinable_sessions() {
    let mut tracker = tracker();
    let id = tracker.create_puzzle("Cryptic Zoo", "ann", t(0)).unwrap();
    for (i, status) in [
        Status::AwaitingEditor,
        Status::IdeaInDevelopment,
        Status::AwaitingAnswer,
        Status::Writing,
        Status::Testsolving,
    ]
    .into_iter()
    .enumerate()
    {
        tracker
            .change_status(id, status, "ann", t(i as i64 + 1))
            .unwrap();
    }
    let session = tracker.open_session(id, "sol", true, t(10)).unwrap();
    assert!(tracker.session(session).unwrap().joinable);

    tracker
        .change_status(id, Status::Revising, "ed", t(20))
        .unwrap();

    assert!(!tracker.session(session).unwrap().joinable);
    let cascade: Vec<&AuditEntry> = tracker
        .history(id)
        .into_iter()
        .filter(|e| e.is_system && e.content == CASCADE_COMMENT)
        .collect();
    assert_eq!(cascade.len(), 1);
    assert_eq!(cascade[0].testsolve_session, Some(session));
    assert_eq!(cascade[0].puzzle_id, id);
}

#[test]
fn done_is_terminal() {
    let engine = WorkflowEngine::default();
    assert!(engine.transitions(Status::Done).is_empty());
    assert_eq!(engine.blocker(Status::Done), Role::Nobody);
    assert!(engine.transitions_of("D").is_empty());
    assert_eq!(engine.blocker_of("D"), Role::Nobody);
}

#[test]
fn writing_breakdown_rest_bucket() {
    let mut puzzles = Vec::new();
    for id in 0..10u64 {
        let mut p = Puzzle::new(id, format!("p{id}"), t(0)).with_status(Status::Writing);
        if id < 3 {
            p = p.with_tag("meta");
        } else if id < 5 {
            p = p.with_tag("event");
        }
        puzzles.push(p);
    }
    let important = vec!["meta".to_string(), "event".to_string()];

    let report = stats::status_breakdown(&puzzles, &important, &[]);
    let row = report.row(Status::Writing).unwrap();
    assert_eq!(row.count, 10);
    assert_eq!(row.rest, 5);
    assert!(report.violations.is_empty());

    // Double-tag enough puzzles to push the remainder below zero.
    for p in puzzles.iter_mut().skip(3) {
        p.tags.insert("meta".into());
        p.tags.insert("event".into());
    }
    let report = stats::status_breakdown(&puzzles, &important, &[]);
    let row = report.row(Status::Writing).unwrap();
    assert!(row.rest >= 0);
    assert_eq!(report.violations.len(), 1);
}

#[test]
fn timeline_totals_match_live_puzzles() {
    let mut tracker = tracker();
    let plan: &[(&str, &[Status])] = &[
        ("a", &[Status::AwaitingEditor, Status::IdeaInDevelopment]),
        ("b", &[Status::Dead]),
        ("c", &[]),
        (
            "d",
            &[
                Status::AwaitingEditor,
                Status::IdeaInDevelopment,
                Status::Deferred,
                Status::IdeaInDevelopment,
            ],
        ),
    ];

    let mut minute = 0;
    for (name, path) in plan {
        let id = tracker.create_puzzle(name, "ann", t(minute)).unwrap();
        for status in *path {
            minute += 1;
            tracker.change_status(id, *status, "ann", t(minute)).unwrap();
        }
        minute += 1;
    }

    let timeline = stats::status_counts_over_time(
        tracker.state().log.entries(),
        DEFAULT_CHART_EXCLUDED,
    );

    // Replay the samples against the puzzles' statuses at each instant.
    let mut seen = BTreeSet::new();
    let status_events: Vec<&AuditEntry> = tracker.state().log.status_events().collect();
    assert_eq!(status_events.len(), timeline.samples.len());
    for (event, sample) in status_events.iter().zip(&timeline.samples) {
        seen.insert(event.puzzle_id);
        let excluded = seen
            .iter()
            .filter(|id| {
                let tag = tracker.state().log.reconstruct_status_at(
                    **id,
                    sample.at,
                    Status::InitialIdea,
                );
                tag.status().is_none_or(|s| DEFAULT_CHART_EXCLUDED.contains(&s))
            })
            .count() as i64;
        assert_eq!(sample.total(), seen.len() as i64 - excluded);
    }

    // Final sample agrees with the live puzzles.
    let live = tracker
        .puzzles()
        .filter(|p| !DEFAULT_CHART_EXCLUDED.contains(&p.status))
        .count() as i64;
    assert_eq!(timeline.samples.last().unwrap().total(), live);
}

#[test]
fn replayed_history_matches_current_status() {
    let mut tracker = tracker();
    let id = tracker.create_puzzle("Cryptic Zoo", "ann", t(0)).unwrap();
    tracker
        .change_status(id, Status::AwaitingEditor, "ann", t(1))
        .unwrap();
    tracker.comment(id, "ed", "nice", t(2)).unwrap();
    tracker
        .change_status(id, Status::NeedsDiscussion, "ed", t(3))
        .unwrap();

    let puzzle = tracker.puzzle(id).unwrap();
    assert_eq!(
        tracker.state().log.latest_status(id),
        Some(&StatusTag::Known(puzzle.status))
    );
    assert_eq!(
        tracker.status_at(id, t(2)).unwrap(),
        StatusTag::Known(Status::AwaitingEditor)
    );
}
