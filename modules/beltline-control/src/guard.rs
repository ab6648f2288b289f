//! Re-entrancy guards, owned exclusively by one control loop instance.

use std::collections::HashSet;

use crate::action::ActionKind;

/// Per-kind in-flight flags. While a kind is held, further matching
/// decisions are dropped — no queueing, no retry.
#[derive(Debug, Default)]
pub struct GuardMap {
    held: HashSet<ActionKind>,
}

impl GuardMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held(&self, kind: ActionKind) -> bool {
        self.held.contains(&kind)
    }

    /// Claim the exclusive right to run `kind`. Returns false if already held.
    pub fn claim(&mut self, kind: ActionKind) -> bool {
        self.held.insert(kind)
    }

    pub fn release(&mut self, kind: ActionKind) {
        self.held.remove(&kind);
    }
}
