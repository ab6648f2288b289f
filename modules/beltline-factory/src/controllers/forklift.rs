//! Drain policy: haul away everything that is packaged, then rest.

use std::time::Duration;

use async_trait::async_trait;
use beltline_control::{Action, ActionKind, ControlError, Controller};
use beltline_engine::Snapshot;
use tokio::sync::watch;

use crate::aggregates::RobotState;
use crate::config::FactoryConfig;
use crate::events::{to_append, RobotEvent, TAG_ROBOT};

pub const DROP_OFF: ActionKind = ActionKind("drop-off");

/// Drains the entire packaged quantity in one action, then holds the guard
/// for a fixed cool-down before accepting further drop-offs.
pub struct ForkliftController {
    robot: watch::Receiver<Snapshot<RobotState>>,
    dropoff_delay: Duration,
    cooldown: Duration,
}

impl ForkliftController {
    pub fn new(robot: watch::Receiver<Snapshot<RobotState>>, config: &FactoryConfig) -> Self {
        Self {
            robot,
            dropoff_delay: config.dropoff_delay,
            cooldown: config.dropoff_cooldown,
        }
    }
}

#[async_trait]
impl Controller for ForkliftController {
    async fn changed(&mut self) -> Result<(), ControlError> {
        self.robot
            .changed()
            .await
            .map_err(|_| ControlError::ObservationClosed)
    }

    fn decide(&mut self) -> Vec<Action> {
        let robot = self.robot.borrow_and_update().value;
        if robot.packaged_qty > 0 {
            vec![Action::new(DROP_OFF, self.dropoff_delay)
                .emit(to_append(
                    TAG_ROBOT,
                    &RobotEvent::PickedUp {
                        qty: robot.packaged_qty,
                    },
                ))
                .with_cooldown(self.cooldown)]
        } else {
            Vec::new()
        }
    }
}
