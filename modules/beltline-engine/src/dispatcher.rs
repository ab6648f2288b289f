//! Live subscriptions: materialize once, then push fresh snapshots.
//!
//! Each registration is independent — its own log subscription, its own tail
//! task. A new subscriber gets the current snapshot immediately (one
//! snapshot, no historical intermediates), then every new snapshot in event
//! arrival order. Aggregates touched by logically-simultaneous appends to
//! different tags update independently; observers may see the two snapshots
//! at different times. That is a property of the design, not a bug.

use std::panic;
use std::sync::Arc;

use beltline_events::{EventLog, EventStream, LogError};
use futures::StreamExt;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::materialize::{apply, materialize, FoldError};
use crate::traits::{AggregateDef, Snapshot};

#[derive(Debug, Error)]
pub enum ObserveError {
    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Fold(#[from] FoldError),
}

/// Hands out live aggregate subscriptions over a shared event log.
#[derive(Clone)]
pub struct AggregateHub {
    log: Arc<dyn EventLog>,
}

impl AggregateHub {
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self { log }
    }

    /// Register a subscriber. Delivers the current materialized state
    /// immediately (possibly the initial state), then one snapshot per
    /// matching event until the handle is stopped.
    pub async fn observe<A, F>(&self, def: A, mut callback: F) -> Result<ObserveHandle, ObserveError>
    where
        A: AggregateDef,
        F: FnMut(Snapshot<A::State>) + Send + 'static,
    {
        let (snapshot, stream) = self.register(&def).await?;
        callback(snapshot.clone());
        Ok(spawn_tail(def, snapshot, stream, callback))
    }

    /// Channel form of `observe` for control loops: the receiver always
    /// holds the latest snapshot; `changed()` wakes on every new one.
    pub async fn watch<A>(
        &self,
        def: A,
    ) -> Result<(watch::Receiver<Snapshot<A::State>>, ObserveHandle), ObserveError>
    where
        A: AggregateDef,
    {
        let (snapshot, stream) = self.register(&def).await?;
        let (tx, rx) = watch::channel(snapshot.clone());
        let handle = spawn_tail(def, snapshot, stream, move |snap| {
            // Send fails only when every receiver is gone; the tail is then
            // pointless but harmless, and stop() cleans it up.
            let _ = tx.send(snap);
        });
        Ok((rx, handle))
    }

    async fn register<A: AggregateDef>(
        &self,
        def: &A,
    ) -> Result<(Snapshot<A::State>, EventStream), ObserveError> {
        let filter = def.tag_filter();
        let history = self.log.read_from(&filter, 1).await?;
        let snapshot = materialize(def, &history)?;
        let stream = self.log.subscribe(filter, snapshot.as_of_seq + 1).await?;
        debug!(aggregate = %snapshot.aggregate, as_of = snapshot.as_of_seq, "subscription registered");
        Ok((snapshot, stream))
    }
}

fn spawn_tail<A, F>(
    def: A,
    mut snapshot: Snapshot<A::State>,
    mut stream: EventStream,
    mut deliver: F,
) -> ObserveHandle
where
    A: AggregateDef,
    F: FnMut(Snapshot<A::State>) + Send + 'static,
{
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => return Ok(()),
                next = stream.next() => {
                    let Some(event) = next else {
                        // Log closed; nothing more will arrive.
                        return Ok(());
                    };
                    match apply(&def, &snapshot, &event) {
                        Ok(next_snapshot) => {
                            snapshot = next_snapshot;
                            deliver(snapshot.clone());
                        }
                        Err(err) => {
                            // Fatal: continuing would corrupt derived state.
                            error!(aggregate = %snapshot.aggregate, %err, "aggregate halted");
                            return Err(ObserveError::Fold(err));
                        }
                    }
                }
            }
        }
    });

    ObserveHandle { cancel, task }
}

/// Handle to a live subscription. Dropping it leaves the tail running;
/// `stop()` cancels it, `join()` waits for it and surfaces a fold failure.
pub struct ObserveHandle {
    cancel: CancellationToken,
    task: JoinHandle<Result<(), ObserveError>>,
}

impl ObserveHandle {
    /// Cancel the tail and wait for it to finish.
    pub async fn stop(self) -> Result<(), ObserveError> {
        self.cancel.cancel();
        self.join().await
    }

    /// Wait for the tail to finish. Returns the fold error if the aggregate
    /// was halted.
    pub async fn join(self) -> Result<(), ObserveError> {
        match self.task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
            Err(_) => Ok(()),
        }
    }
}
