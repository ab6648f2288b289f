//! Actions: what a policy decided to do.

use std::time::Duration;

use beltline_events::AppendEvent;

/// Identity of an action kind within one control loop instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionKind(pub &'static str);

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// A claimed unit of work. The follow-up events are decided when the action
/// starts and emitted after the simulated processing delay elapses.
#[derive(Debug)]
pub struct Action {
    pub kind: ActionKind,
    /// Simulated processing delay (models physical work duration).
    pub delay: Duration,
    /// Events appended on completion. Multiple entries are independent
    /// appends — observers may see them at different times.
    pub emit: Vec<AppendEvent>,
    /// Optional guard hold after completion; the kind stays claimed until
    /// the cool-down elapses.
    pub cooldown: Option<Duration>,
}

impl Action {
    pub fn new(kind: ActionKind, delay: Duration) -> Self {
        Self {
            kind,
            delay,
            emit: Vec::new(),
            cooldown: None,
        }
    }

    pub fn emit(mut self, event: AppendEvent) -> Self {
        self.emit.push(event);
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = Some(cooldown);
        self
    }
}
