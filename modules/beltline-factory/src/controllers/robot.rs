//! Transfer policy: move parts off the machine, package them.
//!
//! A pick-up is two independent appends — the machine debit and the robot
//! credit land as separate events, and an observer can see one before the
//! other. That non-atomicity is a property of the shared log, not a bug.

use std::time::Duration;

use async_trait::async_trait;
use beltline_control::{Action, ActionKind, ControlError, Controller};
use beltline_engine::Snapshot;
use tokio::sync::watch;

use crate::aggregates::{MachineState, RobotState};
use crate::config::FactoryConfig;
use crate::events::{to_append, MachineEvent, RobotEvent, TAG_MACHINE, TAG_ROBOT};

pub const PICK_UP: ActionKind = ActionKind("pick-up");
pub const PACKAGE: ActionKind = ActionKind("package");

pub struct RobotController {
    machine: watch::Receiver<Snapshot<MachineState>>,
    robot: watch::Receiver<Snapshot<RobotState>>,
    pickup_min: i64,
    pickup_qty: i64,
    input_capacity: i64,
    output_capacity: i64,
    pickup_delay: Duration,
    package_delay: Duration,
}

impl RobotController {
    pub fn new(
        machine: watch::Receiver<Snapshot<MachineState>>,
        robot: watch::Receiver<Snapshot<RobotState>>,
        config: &FactoryConfig,
    ) -> Self {
        Self {
            machine,
            robot,
            pickup_min: config.pickup_min,
            pickup_qty: config.pickup_qty,
            input_capacity: config.robot_input_capacity,
            output_capacity: config.robot_output_capacity,
            pickup_delay: config.pickup_delay,
            package_delay: config.package_delay,
        }
    }
}

#[async_trait]
impl Controller for RobotController {
    async fn changed(&mut self) -> Result<(), ControlError> {
        tokio::select! {
            changed = self.machine.changed() => {
                changed.map_err(|_| ControlError::ObservationClosed)
            }
            changed = self.robot.changed() => {
                changed.map_err(|_| ControlError::ObservationClosed)
            }
        }
    }

    fn decide(&mut self) -> Vec<Action> {
        let machine = self.machine.borrow_and_update().value;
        let robot = self.robot.borrow_and_update().value;
        let mut actions = Vec::new();

        // Pick up: upstream has parts to spare and the transfer fits the
        // input buffer (capacity is a hard invariant in the fold, so the
        // headroom check accounts for the whole transfer quantity).
        if machine.buffer_qty > self.pickup_min
            && robot.input_qty + self.pickup_qty <= self.input_capacity
        {
            actions.push(
                Action::new(PICK_UP, self.pickup_delay)
                    .emit(to_append(
                        TAG_MACHINE,
                        &MachineEvent::PickedUp {
                            qty: self.pickup_qty,
                        },
                    ))
                    .emit(to_append(
                        TAG_ROBOT,
                        &RobotEvent::PickedUpFromMachine {
                            qty: self.pickup_qty,
                        },
                    )),
            );
        }

        // Package: input on hand and headroom in the packaged buffer.
        if robot.input_qty > 0 && robot.packaged_qty < self.output_capacity {
            actions.push(
                Action::new(PACKAGE, self.package_delay)
                    .emit(to_append(TAG_ROBOT, &RobotEvent::Packaged { qty: 1 })),
            );
        }

        actions
    }
}
