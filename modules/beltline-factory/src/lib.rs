//! The demo domain: a small factory line (machine → robot → forklift) and a
//! coin-toss toy, all derived from one shared event log.
//!
//! The machine produces parts into its buffer, the robot transfers them and
//! packages them, the forklift drains the packaged output. Each station is a
//! control loop over aggregates folded from the log.

pub mod aggregates;
pub mod config;
pub mod controllers;
pub mod dashboard;
pub mod events;

pub use aggregates::{CoinFace, CoinState, MachineBuffer, MachineState, RobotStation, RobotState};
pub use config::FactoryConfig;
pub use dashboard::Dashboard;
pub use events::{CoinEvent, MachineEvent, RobotEvent, TAG_COIN, TAG_MACHINE, TAG_ROBOT};
