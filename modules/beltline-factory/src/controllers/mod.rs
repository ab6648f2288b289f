//! Station policies, one `Controller` per autonomous loop.

pub mod coin;
pub mod forklift;
pub mod machine;
pub mod robot;

pub use coin::CoinController;
pub use forklift::ForkliftController;
pub use machine::MachineController;
pub use robot::RobotController;
