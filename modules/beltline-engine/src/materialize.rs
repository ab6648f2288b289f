//! Deterministic fold of an ordered, filtered event stream.
//!
//! Two paths compute the same thing: `materialize` replays full history in
//! one pass; `apply` folds one more event onto an existing snapshot. Live
//! subscriptions use the incremental path.

use beltline_events::StoredEvent;
use thiserror::Error;

use crate::traits::{AggregateDef, AggregateId, Snapshot};

/// Raised by a fold that cannot accept an event (domain invariant violated).
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct FoldViolation(pub String);

/// Fatal materialization failure. The aggregate cannot safely continue; the
/// engine halts its updates instead of silently skipping the failing event.
#[derive(Debug, Error)]
pub enum FoldError {
    #[error("{aggregate}: malformed payload at seq {seq}: {source}")]
    Malformed {
        aggregate: AggregateId,
        seq: i64,
        #[source]
        source: serde_json::Error,
    },

    #[error("{aggregate}: fold rejected event at seq {seq}: {violation}")]
    Fold {
        aggregate: AggregateId,
        seq: i64,
        violation: FoldViolation,
    },
}

/// Replay full history from `initial_state`, in strictly increasing seq
/// order, skipping events the tag filter rejects.
pub fn materialize<A: AggregateDef>(
    def: &A,
    events: &[StoredEvent],
) -> Result<Snapshot<A::State>, FoldError> {
    let mut snapshot = Snapshot {
        aggregate: def.id(),
        value: def.initial_state(),
        as_of_seq: 0,
    };
    for event in events {
        snapshot = apply(def, &snapshot, event)?;
    }
    Ok(snapshot)
}

/// Fold one more event onto an existing snapshot.
///
/// Events at or below `as_of_seq` were already applied and are ignored, as
/// are events the tag filter rejects (those still advance `as_of_seq` so a
/// mixed-tag stream does not re-deliver).
pub fn apply<A: AggregateDef>(
    def: &A,
    snapshot: &Snapshot<A::State>,
    event: &StoredEvent,
) -> Result<Snapshot<A::State>, FoldError> {
    let aggregate = def.id();

    if event.seq <= snapshot.as_of_seq {
        return Ok(snapshot.clone());
    }

    if !def.tag_filter().matches(&event.tag) {
        return Ok(Snapshot {
            aggregate,
            value: snapshot.value.clone(),
            as_of_seq: event.seq,
        });
    }

    let decoded: A::Event =
        serde_json::from_value(event.payload.clone()).map_err(|source| FoldError::Malformed {
            aggregate,
            seq: event.seq,
            source,
        })?;

    let value = def
        .fold(snapshot.value.clone(), &decoded)
        .map_err(|violation| FoldError::Fold {
            aggregate,
            seq: event.seq,
            violation,
        })?;

    Ok(Snapshot {
        aggregate,
        value,
        as_of_seq: event.seq,
    })
}
