//! In-memory `EventLog`.
//!
//! Stands in for the external durable log in the demo programs and tests.
//! Live delivery rides a broadcast channel; the broadcast is a nudge, not the
//! delivery guarantee — a lagging subscriber catches up by re-reading from
//! its last delivered seq, so streams stay gap-free and duplicate-free.

use std::sync::{Arc, Mutex};

use async_stream::stream;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::log::{EventLog, EventStream, LogError};
use crate::types::{Ack, AppendEvent, StoredEvent, TagFilter};

const BROADCAST_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct MemoryEventLog {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    events: Vec<StoredEvent>,
    live: broadcast::Sender<StoredEvent>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        let (live, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                events: Vec::new(),
                live,
            })),
        }
    }

    /// All events appended so far (for test assertions).
    pub fn events(&self) -> Vec<StoredEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    fn read_locked(&self, filter: &TagFilter, from_seq: i64) -> Vec<StoredEvent> {
        let inner = self.inner.lock().unwrap();
        inner
            .events
            .iter()
            .filter(|e| e.seq >= from_seq && filter.matches(&e.tag))
            .cloned()
            .collect()
    }
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn append(&self, event: AppendEvent) -> Result<Ack, LogError> {
        let mut inner = self.inner.lock().unwrap();
        let seq = inner.events.len() as i64 + 1;
        let ts = Utc::now();
        let stored = StoredEvent {
            seq,
            ts,
            tag: event.tag,
            payload: event.payload,
        };
        inner.events.push(stored.clone());
        // Send while holding the lock so live delivery preserves seq order.
        // No receivers is fine — history is the source of truth.
        let _ = inner.live.send(stored);
        Ok(Ack { seq, ts })
    }

    async fn read_from(
        &self,
        filter: &TagFilter,
        from_seq: i64,
    ) -> Result<Vec<StoredEvent>, LogError> {
        Ok(self.read_locked(filter, from_seq))
    }

    async fn subscribe(&self, filter: TagFilter, from_seq: i64) -> Result<EventStream, LogError> {
        // Snapshot history and register for live events under one lock so
        // nothing can land between the two.
        let (history, mut rx) = {
            let inner = self.inner.lock().unwrap();
            let history: Vec<StoredEvent> = inner
                .events
                .iter()
                .filter(|e| e.seq >= from_seq && filter.matches(&e.tag))
                .cloned()
                .collect();
            (history, inner.live.subscribe())
        };

        let log = self.clone();
        let stream = stream! {
            let mut last_seq = from_seq - 1;
            for event in history {
                last_seq = event.seq;
                yield event;
            }

            loop {
                match rx.recv().await {
                    Ok(event) => {
                        // Already delivered from history, or filtered out.
                        if event.seq <= last_seq || !filter.matches(&event.tag) {
                            continue;
                        }
                        last_seq = event.seq;
                        yield event;
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!(missed, last_seq, "subscriber lagged; re-reading from log");
                        for event in log.read_locked(&filter, last_seq + 1) {
                            last_seq = event.seq;
                            yield event;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
