//! Integration tests for materialization and the subscription dispatcher.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use beltline_engine::{
    apply, materialize, AggregateDef, AggregateHub, AggregateId, FoldError, FoldViolation,
    Snapshot,
};
use beltline_events::{AppendEvent, EventLog, MemoryEventLog, StoredEvent, TagFilter};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

// ---------------------------------------------------------------------------
// Test aggregate: a clamped counter over tag "counter"
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum CounterEvent {
    Added { qty: i64 },
    Removed { qty: i64 },
}

struct Counter {
    capacity: i64,
}

impl AggregateDef for Counter {
    type Event = CounterEvent;
    type State = i64;

    fn id(&self) -> AggregateId {
        AggregateId::new("counter", 1)
    }

    fn tag_filter(&self) -> TagFilter {
        TagFilter::one("counter")
    }

    fn initial_state(&self) -> i64 {
        0
    }

    fn fold(&self, state: i64, event: &CounterEvent) -> Result<i64, FoldViolation> {
        Ok(match event {
            // Clamp at capacity; additions past full are lost.
            CounterEvent::Added { qty } => (state + qty).min(self.capacity),
            CounterEvent::Removed { qty } => state - qty,
        })
    }
}

/// Counter variant whose fold rejects going negative.
struct StrictCounter;

impl AggregateDef for StrictCounter {
    type Event = CounterEvent;
    type State = i64;

    fn id(&self) -> AggregateId {
        AggregateId::new("strict-counter", 1)
    }

    fn tag_filter(&self) -> TagFilter {
        TagFilter::one("counter")
    }

    fn initial_state(&self) -> i64 {
        0
    }

    fn fold(&self, state: i64, event: &CounterEvent) -> Result<i64, FoldViolation> {
        match event {
            CounterEvent::Added { qty } => Ok(state + qty),
            CounterEvent::Removed { qty } if *qty > state => {
                Err(FoldViolation(format!("cannot remove {qty} from {state}")))
            }
            CounterEvent::Removed { qty } => Ok(state - qty),
        }
    }
}

fn stored(seq: i64, tag: &str, payload: serde_json::Value) -> StoredEvent {
    StoredEvent {
        seq,
        ts: Utc::now(),
        tag: tag.to_string(),
        payload,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within 1s");
}

// =========================================================================
// Materialization
// =========================================================================

#[test]
fn materialize_is_deterministic() {
    let def = Counter { capacity: 10 };
    let events = vec![
        stored(1, "counter", json!({"type": "added", "qty": 3})),
        stored(2, "counter", json!({"type": "removed", "qty": 1})),
        stored(3, "counter", json!({"type": "added", "qty": 2})),
    ];

    let first = materialize(&def, &events).unwrap();
    let second = materialize(&def, &events).unwrap();
    assert_eq!(first.value, 4);
    assert_eq!(first.value, second.value);
    assert_eq!(first.as_of_seq, 3);
}

#[test]
fn incremental_apply_equals_full_replay() {
    let def = Counter { capacity: 10 };
    let events = vec![
        stored(1, "counter", json!({"type": "added", "qty": 5})),
        stored(2, "counter", json!({"type": "removed", "qty": 2})),
        stored(3, "counter", json!({"type": "added", "qty": 4})),
        stored(4, "counter", json!({"type": "removed", "qty": 1})),
    ];

    let replayed = materialize(&def, &events).unwrap();

    let mut incremental = materialize(&def, &[]).unwrap();
    for event in &events {
        incremental = apply(&def, &incremental, event).unwrap();
    }

    assert_eq!(incremental.value, replayed.value);
    assert_eq!(incremental.as_of_seq, replayed.as_of_seq);
}

#[test]
fn fold_is_order_sensitive() {
    let def = Counter { capacity: 3 };

    // Same multiset of events, two different log orders.
    let one = vec![
        stored(1, "counter", json!({"type": "added", "qty": 3})),
        stored(2, "counter", json!({"type": "removed", "qty": 2})),
        stored(3, "counter", json!({"type": "added", "qty": 3})),
    ];
    let other = vec![
        stored(1, "counter", json!({"type": "added", "qty": 3})),
        stored(2, "counter", json!({"type": "added", "qty": 3})),
        stored(3, "counter", json!({"type": "removed", "qty": 2})),
    ];

    let a = materialize(&def, &one).unwrap();
    let b = materialize(&def, &other).unwrap();
    assert_eq!(a.value, 3); // 3 → 1 → 3 (clamped from 4)
    assert_eq!(b.value, 1); // 3 → 3 (clamped) → 1
    assert_ne!(a.value, b.value);
}

#[test]
fn removal_before_addition_goes_negative() {
    let def = Counter { capacity: 10 };
    let events = vec![
        stored(1, "counter", json!({"type": "removed", "qty": 2})),
        stored(2, "counter", json!({"type": "added", "qty": 1})),
    ];

    let snapshot = materialize(&def, &events).unwrap();
    assert_eq!(snapshot.value, -1);
}

#[test]
fn apply_ignores_already_applied_seq() {
    let def = Counter { capacity: 10 };
    let event = stored(1, "counter", json!({"type": "added", "qty": 3}));

    let snapshot = materialize(&def, &[event.clone()]).unwrap();
    let again = apply(&def, &snapshot, &event).unwrap();
    assert_eq!(again.value, 3);
    assert_eq!(again.as_of_seq, 1);
}

#[test]
fn apply_skips_filtered_tags_but_advances_seq() {
    let def = Counter { capacity: 10 };
    let snapshot = materialize(&def, &[]).unwrap();

    let other = stored(7, "robot", json!({"type": "added", "qty": 3}));
    let next = apply(&def, &snapshot, &other).unwrap();
    assert_eq!(next.value, 0);
    assert_eq!(next.as_of_seq, 7);
}

#[test]
fn malformed_payload_is_fatal() {
    let def = Counter { capacity: 10 };
    let events = vec![stored(1, "counter", json!({"type": "exploded"}))];

    let err = materialize(&def, &events).unwrap_err();
    assert!(matches!(err, FoldError::Malformed { seq: 1, .. }));
}

#[test]
fn fold_violation_is_fatal_and_names_the_seq() {
    let def = StrictCounter;
    let events = vec![
        stored(1, "counter", json!({"type": "added", "qty": 1})),
        stored(2, "counter", json!({"type": "removed", "qty": 5})),
    ];

    let err = materialize(&def, &events).unwrap_err();
    assert!(matches!(err, FoldError::Fold { seq: 2, .. }));
}

// =========================================================================
// Dispatcher
// =========================================================================

#[tokio::test]
async fn observe_delivers_initial_state_when_log_is_empty() {
    let log = Arc::new(MemoryEventLog::new());
    let hub = AggregateHub::new(log);

    let seen: Arc<Mutex<Vec<Snapshot<i64>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handle = hub
        .observe(Counter { capacity: 10 }, move |snap| {
            sink.lock().unwrap().push(snap)
        })
        .await
        .unwrap();

    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].value, 0);
        assert_eq!(seen[0].as_of_seq, 0);
    }
    handle.stop().await.unwrap();
}

#[tokio::test]
async fn late_subscriber_gets_current_snapshot_without_history() {
    let log = Arc::new(MemoryEventLog::new());
    let hub = AggregateHub::new(log.clone());

    for qty in [1, 2, 3] {
        log.append(AppendEvent::new(
            "counter",
            json!({"type": "added", "qty": qty}),
        ))
        .await
        .unwrap();
    }

    let seen: Arc<Mutex<Vec<Snapshot<i64>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handle = hub
        .observe(Counter { capacity: 10 }, move |snap| {
            sink.lock().unwrap().push(snap)
        })
        .await
        .unwrap();

    // Exactly one snapshot — the current state, not three intermediates.
    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].value, 6);
        assert_eq!(seen[0].as_of_seq, 3);
    }
    handle.stop().await.unwrap();
}

#[tokio::test]
async fn live_events_produce_snapshots_in_nondecreasing_seq_order() {
    let log = Arc::new(MemoryEventLog::new());
    let hub = AggregateHub::new(log.clone());

    let seen: Arc<Mutex<Vec<Snapshot<i64>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handle = hub
        .observe(Counter { capacity: 10 }, move |snap| {
            sink.lock().unwrap().push(snap)
        })
        .await
        .unwrap();

    for qty in [2, 3] {
        log.append(AppendEvent::new(
            "counter",
            json!({"type": "added", "qty": qty}),
        ))
        .await
        .unwrap();
    }

    let probe = seen.clone();
    wait_until(move || probe.lock().unwrap().len() == 3).await;

    {
        let seen = seen.lock().unwrap();
        let seqs: Vec<i64> = seen.iter().map(|s| s.as_of_seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(seen.last().unwrap().value, 5);
    }
    handle.stop().await.unwrap();
}

#[tokio::test]
async fn two_subscribers_are_independent() {
    let log = Arc::new(MemoryEventLog::new());
    let hub = AggregateHub::new(log.clone());

    let first: Arc<Mutex<Vec<i64>>> = Arc::new(Mutex::new(Vec::new()));
    let second: Arc<Mutex<Vec<i64>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = first.clone();
    let h1 = hub
        .observe(Counter { capacity: 10 }, move |snap| {
            sink.lock().unwrap().push(snap.value)
        })
        .await
        .unwrap();
    let sink = second.clone();
    let h2 = hub
        .observe(Counter { capacity: 10 }, move |snap| {
            sink.lock().unwrap().push(snap.value)
        })
        .await
        .unwrap();

    log.append(AppendEvent::new("counter", json!({"type": "added", "qty": 4})))
        .await
        .unwrap();

    let (p1, p2) = (first.clone(), second.clone());
    wait_until(move || p1.lock().unwrap().len() == 2 && p2.lock().unwrap().len() == 2).await;

    assert_eq!(*first.lock().unwrap(), vec![0, 4]);
    assert_eq!(*second.lock().unwrap(), vec![0, 4]);
    h1.stop().await.unwrap();
    h2.stop().await.unwrap();
}

#[tokio::test]
async fn fold_failure_halts_the_subscription() {
    let log = Arc::new(MemoryEventLog::new());
    let hub = AggregateHub::new(log.clone());

    let handle = hub
        .observe(Counter { capacity: 10 }, |_snap| {})
        .await
        .unwrap();

    log.append(AppendEvent::new("counter", json!({"type": "exploded"})))
        .await
        .unwrap();

    let err = handle.join().await.unwrap_err();
    assert!(matches!(
        err,
        beltline_engine::ObserveError::Fold(FoldError::Malformed { .. })
    ));
}

#[tokio::test]
async fn watch_receiver_tracks_the_latest_snapshot() {
    let log = Arc::new(MemoryEventLog::new());
    let hub = AggregateHub::new(log.clone());

    let (mut rx, handle) = hub.watch(Counter { capacity: 10 }).await.unwrap();
    assert_eq!(rx.borrow().value, 0);

    log.append(AppendEvent::new("counter", json!({"type": "added", "qty": 7})))
        .await
        .unwrap();

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().value, 7);
    assert_eq!(rx.borrow().as_of_seq, 1);

    handle.stop().await.unwrap();
}
