//! Producer policy: keep the machine's buffer fed.

use std::time::Duration;

use async_trait::async_trait;
use beltline_control::{Action, ActionKind, ControlError, Controller};
use beltline_engine::Snapshot;
use tokio::sync::watch;

use crate::aggregates::MachineState;
use crate::config::FactoryConfig;
use crate::events::{to_append, MachineEvent, TAG_MACHINE};

pub const PRODUCE: ActionKind = ActionKind("produce");

/// Starts a "produce" action whenever the buffer is below capacity.
pub struct MachineController {
    machine: watch::Receiver<Snapshot<MachineState>>,
    capacity: i64,
    produce_qty: i64,
    produce_delay: Duration,
}

impl MachineController {
    pub fn new(machine: watch::Receiver<Snapshot<MachineState>>, config: &FactoryConfig) -> Self {
        Self {
            machine,
            capacity: config.machine_capacity,
            produce_qty: config.produce_qty,
            produce_delay: config.produce_delay,
        }
    }
}

#[async_trait]
impl Controller for MachineController {
    async fn changed(&mut self) -> Result<(), ControlError> {
        self.machine
            .changed()
            .await
            .map_err(|_| ControlError::ObservationClosed)
    }

    fn decide(&mut self) -> Vec<Action> {
        let state = self.machine.borrow_and_update().value;
        if state.buffer_qty < self.capacity {
            vec![Action::new(PRODUCE, self.produce_delay).emit(to_append(
                TAG_MACHINE,
                &MachineEvent::Produced {
                    qty: self.produce_qty,
                },
            ))]
        } else {
            Vec::new()
        }
    }
}
