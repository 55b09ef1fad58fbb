//! Post-transition hooks.
//!
//! The engine applies a status change and hands the resulting
//! [`StatusChange`] to every hook. Hooks never touch the audit log or send
//! mail themselves; they return [`HookEffect`]s for the caller to carry out.

use serde::Serialize;
use tracing::debug;

use crate::workflow::StatusChange;

/// A message for the messaging collaborator to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub puzzle_id: u64,
    pub subject: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HookEffect {
    /// Append a system entry to the puzzle's history.
    SystemComment {
        puzzle_id: u64,
        content: String,
        testsolve_session: Option<u64>,
    },
    Notify(Notification),
}

pub trait TransitionHook {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn on_status_change(&mut self, change: &StatusChange) -> Vec<HookEffect>;
}

/// Runs every hook against `change`, in order, collecting their effects.
pub fn dispatch(hooks: &mut [&mut dyn TransitionHook], change: &StatusChange) -> Vec<HookEffect> {
    let mut effects = Vec::new();
    for hook in hooks.iter_mut() {
        let produced = hook.on_status_change(change);
        debug!(
            hook = hook.name(),
            puzzle_id = change.puzzle_id,
            effects = produced.len(),
            "Ran transition hook"
        );
        effects.extend(produced);
    }
    effects
}
