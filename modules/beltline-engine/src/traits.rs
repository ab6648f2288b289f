//! Core traits for the aggregate engine.

use std::fmt;

use beltline_events::TagFilter;
use serde::de::DeserializeOwned;

use crate::materialize::FoldViolation;

/// Identity of an aggregate: name plus state-shape version. Distinct versions
/// denote incompatible state shapes and never share replayed history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AggregateId {
    pub name: &'static str,
    pub version: u32,
}

impl AggregateId {
    pub const fn new(name: &'static str, version: u32) -> Self {
        Self { name, version }
    }
}

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@v{}", self.name, self.version)
    }
}

/// An aggregate definition: tag filter, initial state, and a pure fold.
///
/// `fold` must be deterministic and total — same `(state, event)` pair, same
/// next state, no side effects. A `FoldViolation` is fatal for the
/// aggregate's materialization; the engine never skips a failing event.
pub trait AggregateDef: Send + Sync + 'static {
    type Event: DeserializeOwned + Send;
    type State: Clone + Send + Sync + 'static;

    fn id(&self) -> AggregateId;
    fn tag_filter(&self) -> TagFilter;
    fn initial_state(&self) -> Self::State;
    fn fold(&self, state: Self::State, event: &Self::Event)
        -> Result<Self::State, FoldViolation>;
}

/// A derived state snapshot. Never mutated in place — every matching event
/// produces a new one. `as_of_seq` is 0 before any event has been applied.
#[derive(Debug, Clone)]
pub struct Snapshot<S> {
    pub aggregate: AggregateId,
    pub value: S,
    pub as_of_seq: i64,
}
