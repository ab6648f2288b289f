//! Control loop runtime.
//!
//! A control loop observes derived aggregate state, evaluates a decision
//! policy on every state change, and — subject to a per-action-kind
//! re-entrancy guard — runs a timed action that emits follow-up events.
//! At most one action of a given kind is in flight per loop instance.

pub mod action;
pub mod guard;
pub mod runtime;

pub use action::{Action, ActionKind};
pub use guard::GuardMap;
pub use runtime::{ControlError, ControlLoop, Controller};
