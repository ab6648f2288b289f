//! Read-only console dashboard.
//!
//! Pure projection: consumes snapshots, logs them, emits nothing.

use beltline_engine::{AggregateHub, ObserveError, ObserveHandle};
use tracing::info;

use crate::aggregates::{CoinFace, MachineBuffer, RobotStation};
use crate::config::FactoryConfig;

pub struct Dashboard {
    handles: Vec<ObserveHandle>,
}

impl Dashboard {
    /// Register observers for every aggregate on the line.
    pub async fn start(hub: &AggregateHub, config: &FactoryConfig) -> Result<Self, ObserveError> {
        let mut handles = Vec::new();

        handles.push(
            hub.observe(
                MachineBuffer {
                    capacity: config.machine_capacity,
                },
                |snap| {
                    info!(
                        buffer = snap.value.buffer_qty,
                        as_of = snap.as_of_seq,
                        "machine"
                    );
                },
            )
            .await?,
        );

        handles.push(
            hub.observe(
                RobotStation {
                    input_capacity: config.robot_input_capacity,
                    output_capacity: config.robot_output_capacity,
                },
                |snap| {
                    info!(
                        input = snap.value.input_qty,
                        packaged = snap.value.packaged_qty,
                        as_of = snap.as_of_seq,
                        "robot"
                    );
                },
            )
            .await?,
        );

        handles.push(
            hub.observe(CoinFace, |snap| {
                info!(heads = snap.value.heads, as_of = snap.as_of_seq, "coin");
            })
            .await?,
        );

        Ok(Self { handles })
    }

    pub async fn stop(self) -> Result<(), ObserveError> {
        for handle in self.handles {
            handle.stop().await?;
        }
        Ok(())
    }
}
