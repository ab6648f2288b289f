//! The `EventLog` contract.
//!
//! Append is acknowledged explicitly — callers must handle the result rather
//! than fire-and-forget. Subscriptions are lazy, infinite, and restartable: a
//! consumer that falls behind catches up by reading from its last seen seq.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

use crate::types::{Ack, AppendEvent, StoredEvent, TagFilter};

/// A push stream of events, in strictly increasing seq order.
pub type EventStream = Pin<Box<dyn Stream<Item = StoredEvent> + Send>>;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("event log is closed")]
    Closed,

    #[error("append rejected: {0}")]
    Rejected(String),
}

/// Append-only, tag-addressable event log. The single source of truth.
///
/// Ordering is guaranteed within a single tag's stream by seq; nothing is
/// assumed across tags beyond what the implementation provides.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append an event. The log assigns seq and timestamp.
    async fn append(&self, event: AppendEvent) -> Result<Ack, LogError>;

    /// Read matching events with `seq >= from_seq`, in seq order.
    async fn read_from(
        &self,
        filter: &TagFilter,
        from_seq: i64,
    ) -> Result<Vec<StoredEvent>, LogError>;

    /// Subscribe to matching events starting at `from_seq`. Replays history
    /// first, then tails live appends. Never delivers a seq twice, never
    /// skips one.
    async fn subscribe(&self, filter: TagFilter, from_seq: i64) -> Result<EventStream, LogError>;
}

// Arc blanket so the log can be shared between loops and the dispatcher.
#[async_trait]
impl<L: EventLog + ?Sized> EventLog for Arc<L> {
    async fn append(&self, event: AppendEvent) -> Result<Ack, LogError> {
        (**self).append(event).await
    }

    async fn read_from(
        &self,
        filter: &TagFilter,
        from_seq: i64,
    ) -> Result<Vec<StoredEvent>, LogError> {
        (**self).read_from(filter, from_seq).await
    }

    async fn subscribe(&self, filter: TagFilter, from_seq: i64) -> Result<EventStream, LogError> {
        (**self).subscribe(filter, from_seq).await
    }
}
