//! Puzzle status workflow: the status registry, the transition table, and
//! the engine that applies status changes.

mod engine;
mod puzzle;
pub mod status;
mod table;

#[cfg(test)]
mod property_tests;

pub use engine::{TransitionMode, TransitionOption, WorkflowEngine};
pub use puzzle::{Puzzle, StatusChange};
pub use status::{STATUSES, Status, StatusTag, UNKNOWN_RANK};
pub use table::{
    Role, RuleSpec, Transition, TransitionRule, TransitionSpec, TransitionTable, default_rules,
};
