//! Aggregate definitions: typed, versioned views folded from the log.
//!
//! Nominal capacities are hard invariants: a fold that would push a buffer
//! past its capacity fails, halting the aggregate — racing transfers are a
//! consistency violation, not something to clamp away. Quantities can go
//! negative, though: a debit replayed ahead of its credit must be visible,
//! since that is exactly what out-of-order replay looks like.

use beltline_engine::{AggregateDef, AggregateId, FoldViolation};
use beltline_events::TagFilter;
use serde::Serialize;

use crate::events::{CoinEvent, MachineEvent, RobotEvent, TAG_COIN, TAG_MACHINE, TAG_ROBOT};

// ---------------------------------------------------------------------------
// Machine buffer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MachineState {
    pub buffer_qty: i64,
}

/// The machine's output buffer.
#[derive(Debug, Clone, Copy)]
pub struct MachineBuffer {
    pub capacity: i64,
}

impl AggregateDef for MachineBuffer {
    type Event = MachineEvent;
    type State = MachineState;

    fn id(&self) -> AggregateId {
        AggregateId::new("machine-buffer", 1)
    }

    fn tag_filter(&self) -> TagFilter {
        TagFilter::one(TAG_MACHINE)
    }

    fn initial_state(&self) -> MachineState {
        MachineState { buffer_qty: 0 }
    }

    fn fold(&self, state: MachineState, event: &MachineEvent) -> Result<MachineState, FoldViolation> {
        match event {
            MachineEvent::Produced { qty } => {
                let buffer_qty = state.buffer_qty + qty;
                if buffer_qty > self.capacity {
                    return Err(FoldViolation(format!(
                        "machine buffer over capacity: {buffer_qty} > {}",
                        self.capacity
                    )));
                }
                Ok(MachineState { buffer_qty })
            }
            MachineEvent::PickedUp { qty } => Ok(MachineState {
                buffer_qty: state.buffer_qty - qty,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Robot station
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RobotState {
    pub input_qty: i64,
    pub packaged_qty: i64,
}

/// The robot's input buffer and packaged-output buffer.
#[derive(Debug, Clone, Copy)]
pub struct RobotStation {
    pub input_capacity: i64,
    pub output_capacity: i64,
}

impl AggregateDef for RobotStation {
    type Event = RobotEvent;
    type State = RobotState;

    fn id(&self) -> AggregateId {
        AggregateId::new("robot-station", 1)
    }

    fn tag_filter(&self) -> TagFilter {
        TagFilter::one(TAG_ROBOT)
    }

    fn initial_state(&self) -> RobotState {
        RobotState {
            input_qty: 0,
            packaged_qty: 0,
        }
    }

    fn fold(&self, state: RobotState, event: &RobotEvent) -> Result<RobotState, FoldViolation> {
        match event {
            RobotEvent::PickedUpFromMachine { qty } => {
                let input_qty = state.input_qty + qty;
                if input_qty > self.input_capacity {
                    return Err(FoldViolation(format!(
                        "robot input buffer over capacity: {input_qty} > {}",
                        self.input_capacity
                    )));
                }
                Ok(RobotState { input_qty, ..state })
            }
            RobotEvent::Packaged { qty } => {
                let packaged_qty = state.packaged_qty + qty;
                if packaged_qty > self.output_capacity {
                    return Err(FoldViolation(format!(
                        "robot packaged buffer over capacity: {packaged_qty} > {}",
                        self.output_capacity
                    )));
                }
                Ok(RobotState {
                    input_qty: state.input_qty - qty,
                    packaged_qty,
                })
            }
            RobotEvent::PickedUp { qty } => Ok(RobotState {
                packaged_qty: state.packaged_qty - qty,
                ..state
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Coin
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoinState {
    pub heads: bool,
}

/// The coin-toss toy: state is just the last face shown.
#[derive(Debug, Clone, Copy)]
pub struct CoinFace;

impl AggregateDef for CoinFace {
    type Event = CoinEvent;
    type State = CoinState;

    fn id(&self) -> AggregateId {
        AggregateId::new("coin", 1)
    }

    fn tag_filter(&self) -> TagFilter {
        TagFilter::one(TAG_COIN)
    }

    fn initial_state(&self) -> CoinState {
        CoinState { heads: false }
    }

    fn fold(&self, _state: CoinState, event: &CoinEvent) -> Result<CoinState, FoldViolation> {
        let CoinEvent::Tossed { heads } = event;
        Ok(CoinState { heads: *heads })
    }
}
