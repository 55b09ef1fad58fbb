use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::status::Status;
use crate::error::HuntdeskError;

/// The capability-role nominally responsible for moving a puzzle along.
///
/// Advisory only: "blocked on editors" is display metadata, not an access
/// check. Callers do their own permission checks against a puzzle's people.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Authors,
    Editors,
    Testsolvers,
    Postprodders,
    Factcheckers,
    Nobody,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Authors => "authors",
            Role::Editors => "editors",
            Role::Testsolvers => "testsolvers",
            Role::Postprodders => "postprodders",
            Role::Factcheckers => "factcheckers",
            Role::Nobody => "nobody",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = HuntdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authors" => Ok(Role::Authors),
            "editors" => Ok(Role::Editors),
            "testsolvers" => Ok(Role::Testsolvers),
            "postprodders" => Ok(Role::Postprodders),
            "factcheckers" => Ok(Role::Factcheckers),
            "nobody" => Ok(Role::Nobody),
            _ => Err(HuntdeskError::Config(format!("unknown blocking role: {s}"))),
        }
    }
}

/// One outgoing edge: the target status and the button label offered for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub to: Status,
    pub label: String,
}

impl Transition {
    pub fn new(to: Status, label: impl Into<String>) -> Self {
        Self {
            to,
            label: label.into(),
        }
    }
}

/// Who a status is blocked on, and where it may go next (in presentation order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    pub status: Status,
    pub blocker: Role,
    pub transitions: Vec<Transition>,
}

/// Immutable table of transition rules, indexed by source status.
///
/// A status without a rule is terminal: no transitions, blocked on nobody.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    rules: BTreeMap<Status, TransitionRule>,
    blocked_on: BTreeMap<Role, BTreeSet<Status>>,
}

impl TransitionTable {
    /// Builds a table from rules. A later rule for the same status replaces
    /// an earlier one.
    pub fn new(rules: Vec<TransitionRule>) -> Self {
        let rules: BTreeMap<Status, TransitionRule> =
            rules.into_iter().map(|rule| (rule.status, rule)).collect();

        let mut blocked_on: BTreeMap<Role, BTreeSet<Status>> = BTreeMap::new();
        for rule in rules.values() {
            blocked_on.entry(rule.blocker).or_default().insert(rule.status);
        }

        Self { rules, blocked_on }
    }

    pub fn rule(&self, status: Status) -> Option<&TransitionRule> {
        self.rules.get(&status)
    }

    pub fn blocker(&self, status: Status) -> Role {
        self.rule(status).map_or(Role::Nobody, |rule| rule.blocker)
    }

    pub fn transitions(&self, status: Status) -> &[Transition] {
        self.rule(status)
            .map(|rule| rule.transitions.as_slice())
            .unwrap_or(&[])
    }

    pub fn allows(&self, from: Status, to: Status) -> bool {
        self.transitions(from).iter().any(|t| t.to == to)
    }

    /// Statuses whose rule names `role` as the blocker.
    pub fn statuses_blocked_on(&self, role: Role) -> &BTreeSet<Status> {
        static EMPTY: BTreeSet<Status> = BTreeSet::new();
        self.blocked_on.get(&role).unwrap_or(&EMPTY)
    }

    pub fn is_terminal(&self, status: Status) -> bool {
        self.transitions(status).is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = &TransitionRule> {
        self.rules.values()
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

fn rule(status: Status, blocker: Role, transitions: Vec<Transition>) -> TransitionRule {
    TransitionRule {
        status,
        blocker,
        transitions,
    }
}

/// The production graph shipped with the tracker.
pub fn default_rules() -> Vec<TransitionRule> {
    use Status::*;

    let mark_dead = || Transition::new(Dead, "⏹️ Mark as dead");
    let mark_deferred = || Transition::new(Deferred, "⏸️ Mark as deferred");

    vec![
        rule(
            InitialIdea,
            Role::Authors,
            vec![
                Transition::new(AwaitingEditor, "✅ Ready for an editor"),
                mark_deferred(),
                mark_dead(),
            ],
        ),
        rule(
            AwaitingEditor,
            Role::Editors,
            vec![
                Transition::new(IdeaInDevelopment, "✅ Editors assigned; idea in development"),
                Transition::new(NeedsDiscussion, "🗣 Needs discussion with editors-in-chief"),
            ],
        ),
        rule(
            NeedsDiscussion,
            Role::Editors,
            vec![
                Transition::new(IdeaInDevelopment, "✅ Idea approved; back to development"),
                Transition::new(InitialIdea, "🔄 Send back to the author for rework"),
                mark_dead(),
            ],
        ),
        rule(
            IdeaInDevelopment,
            Role::Authors,
            vec![
                Transition::new(AwaitingAnswer, "✅ Request an answer"),
                Transition::new(WritingFlexible, "📝 Start writing (answer flexible)"),
                mark_deferred(),
                mark_dead(),
            ],
        ),
        rule(
            AwaitingAnswer,
            Role::Editors,
            vec![Transition::new(Writing, "✅ Answer assigned; start writing")],
        ),
        rule(
            Writing,
            Role::Authors,
            vec![
                Transition::new(Testsolving, "✅ Put into testsolving"),
                mark_deferred(),
            ],
        ),
        rule(
            WritingFlexible,
            Role::Authors,
            vec![
                Transition::new(Writing, "✅ Answer assigned"),
                Transition::new(Testsolving, "✅ Put into testsolving"),
                mark_deferred(),
            ],
        ),
        rule(
            Testsolving,
            Role::Testsolvers,
            vec![
                Transition::new(
                    AwaitingTestsolveReview,
                    "🧐 Testsolve done; author to review feedback",
                ),
                Transition::new(Revising, "❌ Testsolve done; needs revision and more testsolving"),
                Transition::new(
                    RevisingPostTestsolving,
                    "⭕ Testsolve done; needs revision (but not testsolving)",
                ),
                Transition::new(NeedsSolution, "✅ Accept testsolve; request solution"),
            ],
        ),
        rule(
            AwaitingTestsolveReview,
            Role::Authors,
            vec![
                Transition::new(Testsolving, "🔄 Ready for more testsolving"),
                Transition::new(Revising, "❌ Needs revision and more testsolving"),
                Transition::new(
                    RevisingPostTestsolving,
                    "⭕ Needs revision (but not testsolving)",
                ),
                Transition::new(NeedsSolution, "✅ Accept testsolve; request solution"),
            ],
        ),
        rule(
            Revising,
            Role::Authors,
            vec![
                Transition::new(Testsolving, "📝 Put back into testsolving"),
                Transition::new(
                    RevisingPostTestsolving,
                    "⭕ Revisions no longer need testsolving",
                ),
            ],
        ),
        rule(
            RevisingPostTestsolving,
            Role::Authors,
            vec![
                Transition::new(NeedsSolution, "✅ Revisions done; request solution"),
                Transition::new(Testsolving, "🔄 Needs more testsolving after all"),
            ],
        ),
        rule(
            NeedsSolution,
            Role::Authors,
            vec![Transition::new(NeedsPostprod, "✅ Solution written; ready for postprod")],
        ),
        rule(
            NeedsPostprod,
            Role::Postprodders,
            vec![Transition::new(
                AwaitingPostprodApproval,
                "📝 Postprod done; awaiting approval",
            )],
        ),
        rule(
            AwaitingPostprodApproval,
            Role::Editors,
            vec![
                Transition::new(NeedsFactcheck, "✅ Postprod approved; needs factcheck"),
                Transition::new(NeedsPostprod, "❌ Request more postprod work"),
            ],
        ),
        rule(
            NeedsFactcheck,
            Role::Factcheckers,
            vec![
                Transition::new(NeedsCopyEdits, "✅ Factcheck done; needs copy edits"),
                Transition::new(
                    RevisingPostTestsolving,
                    "❌ Factcheck found issues; needs revision",
                ),
            ],
        ),
        rule(
            NeedsCopyEdits,
            Role::Factcheckers,
            vec![Transition::new(Done, "🎉 Copy edits done; mark as done 🎉")],
        ),
        rule(
            Deferred,
            Role::Nobody,
            vec![Transition::new(IdeaInDevelopment, "🔄 Back in development")],
        ),
    ]
}

/// A rule as written in `huntdesk.toml`, before codes are checked against
/// the registry.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    pub status: String,
    pub blocker: String,
    #[serde(default)]
    pub transitions: Vec<TransitionSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionSpec {
    pub to: String,
    pub label: String,
}

impl TransitionTable {
    /// Builds a table from configuration, rejecting any code the registry
    /// does not know.
    pub fn from_specs(specs: &[RuleSpec]) -> Result<Self, HuntdeskError> {
        let mut rules = Vec::with_capacity(specs.len());
        for spec in specs {
            let status: Status = spec.status.parse()?;
            let blocker: Role = spec.blocker.parse()?;
            let transitions = spec
                .transitions
                .iter()
                .map(|t| -> Result<Transition, HuntdeskError> {
                    Ok(Transition::new(t.to.parse()?, t.label.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            rules.push(TransitionRule {
                status,
                blocker,
                transitions,
            });
        }
        Ok(Self::new(rules))
    }
}
