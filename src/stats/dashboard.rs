use std::collections::BTreeMap;

use serde::Serialize;

use crate::workflow::{Puzzle, Role, Status, TransitionTable};

/// Puzzles waiting on one user, grouped by why.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Inbox {
    pub authoring: Vec<u64>,
    pub editing: Vec<u64>,
    pub factchecking: Vec<u64>,
    pub postprodding: Vec<u64>,
}

impl Inbox {
    pub fn is_empty(&self) -> bool {
        self.authoring.is_empty()
            && self.editing.is_empty()
            && self.factchecking.is_empty()
            && self.postprodding.is_empty()
    }
}

/// The "blocked on me" view for `user`.
pub fn inbox<'a, I>(puzzles: I, user: &str, table: &TransitionTable) -> Inbox
where
    I: IntoIterator<Item = &'a Puzzle>,
{
    let on_authors = table.statuses_blocked_on(Role::Authors);
    let on_editors = table.statuses_blocked_on(Role::Editors);
    let mut inbox = Inbox::default();

    for puzzle in puzzles {
        if puzzle.has_role(user, Role::Authors) && on_authors.contains(&puzzle.status) {
            inbox.authoring.push(puzzle.id);
        }
        if puzzle.has_role(user, Role::Editors) && on_editors.contains(&puzzle.status) {
            inbox.editing.push(puzzle.id);
        }
        if puzzle.status == Status::NeedsFactcheck && puzzle.has_role(user, Role::Factcheckers) {
            inbox.factchecking.push(puzzle.id);
        }
        if puzzle.status == Status::NeedsPostprod && puzzle.has_role(user, Role::Postprodders) {
            inbox.postprodding.push(puzzle.id);
        }
    }
    inbox
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditorWorkload {
    pub all: usize,
    pub pre_testsolving: usize,
    pub post_testsolving: usize,
    pub done: usize,
    pub deferred: usize,
    pub dead: usize,
}

/// How many puzzles each editor is on, by stage. Editors with no puzzles
/// do not appear.
pub fn editor_workload<'a, I>(puzzles: I) -> BTreeMap<String, EditorWorkload>
where
    I: IntoIterator<Item = &'a Puzzle>,
{
    let mut workload: BTreeMap<String, EditorWorkload> = BTreeMap::new();
    for puzzle in puzzles {
        for editor in &puzzle.editors {
            let counts = workload.entry(editor.clone()).or_default();
            counts.all += 1;
            match puzzle.status {
                Status::Done => counts.done += 1,
                Status::Deferred => counts.deferred += 1,
                Status::Dead => counts.dead += 1,
                s if s.is_pre_testsolving() => counts.pre_testsolving += 1,
                s if s.is_post_testsolving() => counts.post_testsolving += 1,
                _ => {}
            }
        }
    }
    workload
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn puzzle(id: u64, status: Status) -> Puzzle {
        Puzzle::new(id, format!("p{id}"), Utc::now()).with_status(status)
    }

    #[test]
    fn inbox_collects_blocked_puzzles() {
        let mut factcheck = puzzle(3, Status::NeedsFactcheck);
        factcheck.factcheckers.insert("kim".into());
        let mut postprod = puzzle(4, Status::NeedsPostprod);
        postprod.postprodders.insert("kim".into());

        let puzzles = vec![
            puzzle(1, Status::Writing).with_author("kim"),
            puzzle(2, Status::AwaitingEditor).with_editor("kim"),
            puzzle(5, Status::Testsolving).with_author("kim").with_editor("kim"),
            puzzle(6, Status::Writing).with_author("lee"),
            factcheck,
            postprod,
        ];

        let inbox = inbox(&puzzles, "kim", &TransitionTable::default());
        assert_eq!(inbox.authoring, vec![1]);
        assert_eq!(inbox.editing, vec![2]);
        assert_eq!(inbox.factchecking, vec![3]);
        assert_eq!(inbox.postprodding, vec![4]);
        assert!(super::inbox(&puzzles, "nobody", &TransitionTable::default()).is_empty());
    }

    #[test]
    fn workload_buckets_by_stage() {
        let puzzles = vec![
            puzzle(1, Status::Writing).with_editor("ed"),
            puzzle(2, Status::Testsolving).with_editor("ed"),
            puzzle(3, Status::NeedsFactcheck).with_editor("ed").with_editor("fay"),
            puzzle(4, Status::Done).with_editor("ed"),
            puzzle(5, Status::Deferred).with_editor("ed"),
            puzzle(6, Status::Dead).with_editor("ed"),
            puzzle(7, Status::Writing),
        ];

        let workload = editor_workload(&puzzles);
        assert_eq!(
            workload["ed"],
            EditorWorkload {
                all: 6,
                pre_testsolving: 1,
                post_testsolving: 1,
                done: 1,
                deferred: 1,
                dead: 1,
            }
        );
        assert_eq!(workload["fay"].all, 1);
        assert_eq!(workload.len(), 2);
    }
}
