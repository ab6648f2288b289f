//! Aggregate engine and subscription dispatcher.
//!
//! An aggregate is a typed, versioned view derived by deterministically
//! folding a tag-filtered slice of the event log. The engine computes that
//! fold (full replay or one event at a time); the dispatcher keeps live
//! subscriptions fed with fresh snapshots.

pub mod dispatcher;
pub mod materialize;
pub mod traits;

pub use dispatcher::{AggregateHub, ObserveError, ObserveHandle};
pub use materialize::{apply, materialize, FoldError, FoldViolation};
pub use traits::{AggregateDef, AggregateId, Snapshot};
